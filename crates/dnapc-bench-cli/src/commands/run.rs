use anyhow::{Context, Result};
use console::style;
use dnapc_bench::{dispatch, ConfigManager, Services, TaskReport};
use std::path::{Path, PathBuf};

/// Resolve the configuration, run one task and print its report.
///
/// `task` takes precedence over the task named in the config.
pub fn handle_run(
    config: &Path,
    task: Option<String>,
    overrides: &[String],
    report: Option<PathBuf>,
) -> Result<TaskReport> {
    let bench_config = ConfigManager::from_file(config, overrides)
        .with_context(|| format!("Failed to load configuration from {}", config.display()))?
        .into_config();
    let task = task.unwrap_or_else(|| bench_config.task.clone());
    if let Ok(json) = bench_config.to_json() {
        tracing::debug!("resolved configuration:\n{}", json);
    }

    let services = Services::default();
    let result = dispatch(&task, bench_config, &services)
        .with_context(|| format!("Task {} failed", task))?;

    println!("{}", style(format!("Finished {}", result.task)).green().bold());
    print!("{}", result);

    if let Some(path) = report {
        result
            .save(&path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("Report saved to: {}", style(path.display()).cyan());
    }
    Ok(result)
}
