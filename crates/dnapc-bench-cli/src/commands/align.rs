use anyhow::{Context, Result};
use console::style;
use dnapc_bench::names::extract_name;
use dnapc_bench::sequencer::{aligned_io_files, load_records, load_records_parallel};
use dnapc_bench::ConfigManager;
use std::path::Path;

/// Print what the configured io directories align to, and optionally decode
/// every aligned file up front.
///
/// Returns the aligned base names.
pub fn handle_align(
    config: &Path,
    overrides: &[String],
    except: &[String],
    load: bool,
) -> Result<Vec<String>> {
    let bench_config = ConfigManager::from_file(config, overrides)
        .with_context(|| format!("Failed to load configuration from {}", config.display()))?
        .into_config();

    let exceptions: Vec<&str> = except.iter().map(String::as_str).collect();
    let (roles, files) =
        aligned_io_files(&bench_config, &exceptions).context("Failed to align io directories")?;

    let names: Vec<String> = files
        .first()
        .map(|list| list.iter().map(extract_name).collect())
        .unwrap_or_default();

    println!(
        "{} {} record(s) across {}",
        style("Aligned").green().bold(),
        names.len(),
        roles.join(", ")
    );
    for name in &names {
        println!("  {}", name);
    }

    if load {
        for (role, list) in roles.iter().zip(&files) {
            let records = if bench_config.parallel_load {
                load_records_parallel(list)
            } else {
                load_records(list)
            }
            .with_context(|| format!("Failed to load io.{}", role))?;

            println!("{}", style(format!("io.{}", role)).cyan());
            for (name, record) in names.iter().zip(&records) {
                println!("  {}: {} {:?}", name, record.kind(), record.shape());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_reports_common_names() {
        let dir = tempfile::tempdir().unwrap();
        for (role, names) in [("x", ["a", "b", "c"]), ("y", ["a", "b", "d"])] {
            let role_dir = dir.path().join(role);
            fs::create_dir_all(&role_dir).unwrap();
            for name in names {
                fs::write(role_dir.join(format!("{name}.npy")), "").unwrap();
            }
        }
        let config = dir.path().join("config.yaml");
        fs::write(
            &config,
            format!(
                "task: play\nio:\n  x: {}\n  y: {}\n",
                dir.path().join("x").display(),
                dir.path().join("y").display()
            ),
        )
        .unwrap();

        let names = handle_align(&config, &[], &[], false).unwrap();
        assert_eq!(names, vec!["a", "b"]);

        let names = handle_align(&config, &[], &["y".to_string()], false).unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
