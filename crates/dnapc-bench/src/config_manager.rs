use crate::bench_config::{BenchConfig, DEFAULT_RESOLUTION};
use crate::errors::{util::ensure_file_exists, BenchError, BenchResult};
use crate::tasks::TaskSpec;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;

/// Prefix of environment overrides, e.g. `DNAPC_BENCH__BLOCKS__RESOLUTION=32`.
pub const ENV_PREFIX: &str = "DNAPC_BENCH";

/// Resolves the run configuration from a file, the environment and
/// `key=value` overrides, in increasing order of precedence.
pub struct ConfigManager {
    config: BenchConfig,
}

impl ConfigManager {
    /// Load from a YAML, TOML or JSON file (picked by extension).
    pub fn from_file<P: AsRef<Path>>(path: P, overrides: &[String]) -> BenchResult<Self> {
        let path = path.as_ref();
        ensure_file_exists(path)?;
        let builder = Config::builder().add_source(File::from(path));
        Self::build(builder, overrides)
    }

    /// Load from an in-memory YAML document.
    pub fn from_string(content: &str, overrides: &[String]) -> BenchResult<Self> {
        let builder = Config::builder().add_source(File::from_str(content, FileFormat::Yaml));
        Self::build(builder, overrides)
    }

    fn build(builder: ConfigBuilder<DefaultState>, overrides: &[String]) -> BenchResult<Self> {
        let mut builder = builder
            .set_default("blocks.resolution", DEFAULT_RESOLUTION as u64)?
            .set_default("blocks.channel_last", true)?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        for item in overrides {
            let (key, value) = parse_override(item)?;
            builder = builder.set_override(key, value)?;
        }

        let config: BenchConfig = builder
            .build()?
            .try_deserialize()
            .map_err(|err| {
                tracing::debug!("Configuration error: {:?}", &err);
                missing_field_hint(&err.to_string())
                    .map(BenchError::ConfigError)
                    .unwrap_or_else(|| BenchError::from(err))
            })?;

        tracing::debug!(task = %config.task, roles = config.io.len(), "configuration resolved");
        Ok(Self { config })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn into_config(self) -> BenchConfig {
        self.config
    }

    /// Validate the task name and hand out the spec the dispatcher consumes.
    pub fn into_task_spec(self) -> BenchResult<TaskSpec> {
        TaskSpec::new(self.config)
    }
}

/// Split a hydra-style `key=value` override.
pub fn parse_override(item: &str) -> BenchResult<(&str, &str)> {
    match item.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(BenchError::ConfigError(format!(
            "Invalid override '{}', expected key=value",
            item
        ))),
    }
}

/// Environment variable that would provide a dotted config key.
pub fn to_env_var(field_path: &str) -> String {
    format!(
        "{}__{}",
        ENV_PREFIX,
        field_path.replace('.', "__").to_uppercase()
    )
}

fn missing_field_hint(message: &str) -> Option<String> {
    let field = message.strip_prefix("missing field `")?;
    let field = field.split('`').next()?;
    Some(format!(
        "Missing required field '{}': set it in the config file, pass --set {}=..., or export {}",
        field,
        field,
        to_env_var(field)
    ))
}
