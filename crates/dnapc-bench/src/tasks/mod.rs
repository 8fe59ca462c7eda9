//! Benchmark routines and the closed set of names they are selected by.

mod bypass_dna;
mod evaluate_y_reconstruction;
mod play;
mod quantization;
mod quantization_tables;
pub mod registry;
mod study_output_analysis;

pub use bypass_dna::BypassDna;
pub use evaluate_y_reconstruction::EvaluateYReconstruction;
pub use play::Play;
pub use quantization::Quantization;
pub use quantization_tables::QuantizationTables;
pub use registry::{dispatch, TaskRegistry};
pub use study_output_analysis::StudyOutputAnalysis;

use crate::bench_config::BenchConfig;
use crate::errors::{BenchError, BenchResult};
use crate::reporting::TaskReport;
use crate::sequencer::RecordGroup;
use crate::services::Services;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Every task the harness knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskName {
    BypassDna,
    QuantizationTables,
    Quantization,
    EvaluateYReconstruction,
    Play,
    StudyOutputAnalysis,
}

impl TaskName {
    pub const ALL: [TaskName; 6] = [
        TaskName::BypassDna,
        TaskName::QuantizationTables,
        TaskName::Quantization,
        TaskName::EvaluateYReconstruction,
        TaskName::Play,
        TaskName::StudyOutputAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::BypassDna => "bypass_dna",
            TaskName::QuantizationTables => "quantization_tables",
            TaskName::Quantization => "quantization",
            TaskName::EvaluateYReconstruction => "evaluate_y_reconstruction",
            TaskName::Play => "play",
            TaskName::StudyOutputAnalysis => "study_output_analysis",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(TaskName::as_str).collect()
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| BenchError::UnknownTask {
                task: s.to_string(),
                available: Self::names(),
            })
    }
}

/// A validated task name together with the configuration it runs with.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    name: TaskName,
    config: BenchConfig,
}

impl TaskSpec {
    /// Validate `config.task` against the known task names.
    pub fn new(config: BenchConfig) -> BenchResult<Self> {
        let name = config.task.parse()?;
        Ok(Self { name, config })
    }

    /// Run `task_name` with `config`, ignoring the task the config names.
    pub fn with_name(task_name: &str, mut config: BenchConfig) -> BenchResult<Self> {
        let name = task_name.parse()?;
        config.task = task_name.to_string();
        Ok(Self { name, config })
    }

    pub fn name(&self) -> TaskName {
        self.name
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }
}

/// Values a task exposes for inspection after it returns.
///
/// Owned by the caller and handed to the task for the duration of one run.
#[derive(Debug, Default)]
pub struct Scratch {
    /// Aligned path lists, one per loaded role.
    pub files: Vec<Vec<PathBuf>>,
    /// Role labels matching `files`.
    pub roles: Vec<String>,
    /// The last record group a task pulled.
    pub last_group: Option<RecordGroup>,
}

/// What a task may touch while it runs.
pub struct TaskContext<'a> {
    pub config: &'a BenchConfig,
    pub services: &'a Services,
    pub scratch: &'a mut Scratch,
}

pub trait BenchTask {
    fn name(&self) -> TaskName;
    fn run(&self, ctx: &mut TaskContext<'_>) -> BenchResult<TaskReport>;
}

/// Position of `label` among the loaded roles.
pub(crate) fn role_index(roles: &[String], label: &str) -> BenchResult<usize> {
    roles.iter().position(|role| role == label).ok_or_else(|| {
        BenchError::ConfigError(format!(
            "No directory configured for io.{} (loaded roles: {:?})",
            label, roles
        ))
    })
}

pub(crate) fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}
