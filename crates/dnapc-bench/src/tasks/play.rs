use super::{BenchTask, TaskContext, TaskName};
use crate::errors::BenchResult;
use crate::reporting::TaskReport;

/// Does nothing. Used to check that configuration and dispatch work.
#[derive(Debug, Default)]
pub struct Play {}

impl Play {
    pub fn new() -> Self {
        Play {}
    }
}

impl BenchTask for Play {
    fn name(&self) -> TaskName {
        TaskName::Play
    }

    fn run(&self, _ctx: &mut TaskContext<'_>) -> BenchResult<TaskReport> {
        Ok(TaskReport::new(self.name().as_str()))
    }
}
