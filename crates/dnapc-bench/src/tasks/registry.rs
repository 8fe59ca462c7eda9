use super::{
    BenchTask, BypassDna, EvaluateYReconstruction, Play, Quantization, QuantizationTables,
    Scratch, StudyOutputAnalysis, TaskContext, TaskName, TaskSpec,
};
use crate::bench_config::BenchConfig;
use crate::errors::{BenchError, BenchResult};
use crate::reporting::TaskReport;
use crate::services::Services;
use std::collections::HashMap;
use std::time::Instant;

type TaskConstructor = Box<dyn Fn() -> Box<dyn BenchTask> + Send + Sync>;

/// Lookup table from task name to handler.
pub struct TaskRegistry {
    tasks: HashMap<TaskName, TaskConstructor>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TaskRegistry {
    pub fn empty() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    /// Registry holding the six shipped routines.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(TaskName::BypassDna, || Box::new(BypassDna::new()));
        registry.register(TaskName::QuantizationTables, || {
            Box::new(QuantizationTables::new())
        });
        registry.register(TaskName::Quantization, || Box::new(Quantization::new()));
        registry.register(TaskName::EvaluateYReconstruction, || {
            Box::new(EvaluateYReconstruction::new())
        });
        registry.register(TaskName::Play, || Box::new(Play::new()));
        registry.register(TaskName::StudyOutputAnalysis, || {
            Box::new(StudyOutputAnalysis::new())
        });
        registry
    }

    /// Install or replace the handler of `name`.
    pub fn register(
        &mut self,
        name: TaskName,
        constructor: impl Fn() -> Box<dyn BenchTask> + Send + Sync + 'static,
    ) {
        self.tasks.insert(name, Box::new(constructor));
    }

    pub fn create(&self, name: TaskName) -> BenchResult<Box<dyn BenchTask>> {
        let constructor = self.tasks.get(&name).ok_or_else(|| {
            BenchError::ConfigError(format!("No handler registered for task {}", name))
        })?;
        Ok(constructor())
    }

    /// Registered task names, sorted.
    pub fn available(&self) -> Vec<TaskName> {
        let mut names: Vec<_> = self.tasks.keys().copied().collect();
        names.sort();
        names
    }

    /// Run the task of `spec` once, to completion.
    pub fn run(
        &self,
        spec: &TaskSpec,
        services: &Services,
        scratch: &mut Scratch,
    ) -> BenchResult<TaskReport> {
        let task = self.create(spec.name())?;
        let mut ctx = TaskContext {
            config: spec.config(),
            services,
            scratch,
        };

        tracing::info!(task = %spec.name(), "starting task");
        let started = Instant::now();
        let result = task.run(&mut ctx);
        match &result {
            Ok(report) => tracing::info!(
                task = %spec.name(),
                metrics = report.metrics.len(),
                artifacts = report.artifacts.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "task finished"
            ),
            Err(e) => tracing::error!(task = %spec.name(), "task failed: {}", e),
        }
        result
    }
}

/// Validate `task_name` and run it with the built-in registry.
///
/// An unknown name fails before any routine is constructed.
pub fn dispatch(
    task_name: &str,
    config: BenchConfig,
    services: &Services,
) -> BenchResult<TaskReport> {
    let spec = TaskSpec::with_name(task_name, config)?;
    TaskRegistry::builtin().run(&spec, services, &mut Scratch::default())
}
