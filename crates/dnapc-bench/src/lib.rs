pub mod align;
pub mod bench_config;
pub mod config_manager;
pub mod errors;
pub mod loader;
pub mod metrics;
pub mod names;
pub mod reporting;
pub mod sequencer;
pub mod services;
pub mod tasks;

// Re-export main components for easier use
pub use align::align_files;
pub use bench_config::BenchConfig;
pub use config_manager::ConfigManager;
pub use errors::{BenchError, BenchResult};
pub use loader::{load_file, Record};
pub use reporting::{EvaluationMetric, TaskReport};
pub use sequencer::{load_io_files, LazyRecords, RecordGroup};
pub use services::Services;
pub use tasks::{dispatch, Scratch, TaskName, TaskRegistry, TaskSpec};
