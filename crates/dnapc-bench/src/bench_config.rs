use crate::errors::{BenchError, BenchResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_RESOLUTION: usize = 64;

/// Voxel block settings forwarded to the dataset builder.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlocksConfig {
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    #[serde(default = "default_channel_last")]
    pub channel_last: bool,
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            channel_last: default_channel_last(),
        }
    }
}

/// One configured input/output role, e.g. `x` or `y_hat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedDirectory<'a> {
    pub label: &'a str,
    pub path: &'a Path,
}

/// Resolved configuration of a benchmark run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BenchConfig {
    pub task: String,
    /// Role label to directory, in declaration order.
    #[serde(default)]
    pub io: IndexMap<String, PathBuf>,
    #[serde(default)]
    pub blocks: BlocksConfig,
    /// Passed untouched to the model builder.
    #[serde(default = "default_architecture")]
    pub architecture: Value,
    /// Root under which tasks write their artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Seed for synthetic inputs; entropy is used when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
    /// Load per-role files on the rayon pool when loading eagerly.
    #[serde(default)]
    pub parallel_load: bool,
}

impl BenchConfig {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            io: IndexMap::new(),
            blocks: BlocksConfig::default(),
            architecture: default_architecture(),
            output_dir: default_output_dir(),
            seed: None,
            show_progress: default_show_progress(),
            parallel_load: false,
        }
    }

    pub fn with_io(mut self, label: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.io.insert(label.into(), dir.into());
        self
    }

    /// Directory configured for `role`.
    pub fn io_dir(&self, role: &str) -> BenchResult<&Path> {
        self.io.get(role).map(PathBuf::as_path).ok_or_else(|| {
            BenchError::ConfigError(format!("No directory configured for io.{}", role))
        })
    }

    /// Configured roles minus `exceptions`, in declaration order.
    pub fn roles<'a>(&'a self, exceptions: &[&str]) -> Vec<NamedDirectory<'a>> {
        self.io
            .iter()
            .filter(|(label, _)| !exceptions.contains(&label.as_str()))
            .map(|(label, path)| NamedDirectory {
                label: label.as_str(),
                path: path.as_path(),
            })
            .collect()
    }

    /// Pretty-printed JSON of the resolved configuration.
    pub fn to_json(&self) -> BenchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn default_resolution() -> usize {
    DEFAULT_RESOLUTION
}

fn default_channel_last() -> bool {
    true
}

fn default_architecture() -> Value {
    Value::Object(Default::default())
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_show_progress() -> bool {
    true
}
