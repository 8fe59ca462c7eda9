use super::{progress_bar, role_index, BenchTask, TaskContext, TaskName};
use crate::align::zip_aligned;
use crate::errors::BenchResult;
use crate::metrics::{min_max, MseAccumulator};
use crate::reporting::{EvaluationMetric, TaskReport};
use crate::sequencer::{aligned_io_files, LazyRecords};

/// Compare stored latents `y` with their reconstructions `y_hat`.
///
/// Reports the mean squared error over every element of every pair and
/// the range of `y`.
#[derive(Debug, Default)]
pub struct EvaluateYReconstruction {}

impl EvaluateYReconstruction {
    pub fn new() -> Self {
        EvaluateYReconstruction {}
    }
}

impl BenchTask for EvaluateYReconstruction {
    fn name(&self) -> TaskName {
        TaskName::EvaluateYReconstruction
    }

    fn run(&self, ctx: &mut TaskContext<'_>) -> BenchResult<TaskReport> {
        let config = ctx.config;
        let (roles, files) = aligned_io_files(config, &["x", "x_hat"])?;
        let y_index = role_index(&roles, "y")?;
        let y_hat_index = role_index(&roles, "y_hat")?;

        ctx.scratch.roles = roles;
        ctx.scratch.files = files.clone();

        let groups = LazyRecords::new(zip_aligned(files));
        let bar = progress_bar(groups.remaining(), config.show_progress);
        let mut error = MseAccumulator::default();
        let mut range: Option<(f64, f64)> = None;
        let mut pairs = 0usize;

        for group in groups {
            let group = group?;
            let y = group.records[y_index].to_array()?;
            let y_hat = group.records[y_hat_index].to_array()?;
            error.add(y.view(), y_hat.view())?;

            if let Some((lo, hi)) = min_max(&y) {
                range = Some(match range {
                    Some((min, max)) => (min.min(lo), max.max(hi)),
                    None => (lo, hi),
                });
            }

            pairs += 1;
            ctx.scratch.last_group = Some(group);
            bar.inc(1);
        }
        bar.finish_and_clear();

        let mut report = TaskReport::new(self.name().as_str());
        report.add_metric("mse", EvaluationMetric::Float(error.mean()));
        if let Some((min, max)) = range {
            report.add_metric("max", EvaluationMetric::Float(max));
            report.add_metric("min", EvaluationMetric::Float(min));
        }
        report.add_metric("pairs", EvaluationMetric::Integer(pairs as i64));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench_config::BenchConfig;
    use crate::errors::BenchError;
    use crate::services::Services;
    use crate::tasks::Scratch;
    use ndarray::arr1;
    use ndarray_npy::write_npy;
    use std::fs;
    use std::path::Path;

    fn write(dir: &Path, name: &str, values: &[f64]) {
        fs::create_dir_all(dir).unwrap();
        write_npy(dir.join(name), &arr1(values)).unwrap();
    }

    fn run(config: &BenchConfig, scratch: &mut Scratch) -> BenchResult<TaskReport> {
        let services = Services::default();
        let mut ctx = TaskContext {
            config,
            services: &services,
            scratch,
        };
        EvaluateYReconstruction::new().run(&mut ctx)
    }

    #[test]
    fn test_mse_and_range_over_aligned_pairs() {
        let root = tempfile::tempdir().unwrap();
        let (x, y, y_hat) = (
            root.path().join("x"),
            root.path().join("y"),
            root.path().join("y_hat"),
        );
        write(&y, "a.npy", &[1.0, 2.0]);
        write(&y, "b.npy", &[-3.0, 4.0]);
        write(&y, "extra.npy", &[100.0, 100.0]);
        write(&y_hat, "a.npy", &[1.0, 0.0]);
        write(&y_hat, "b.npy", &[-3.0, 4.0]);
        // x is never read
        fs::create_dir_all(&x).unwrap();

        let config = BenchConfig::new("evaluate_y_reconstruction")
            .with_io("x", &x)
            .with_io("y", &y)
            .with_io("y_hat", &y_hat);
        let mut scratch = Scratch::default();
        let report = run(&config, &mut scratch).unwrap();

        assert_eq!(report.metric("mse"), Some(&EvaluationMetric::Float(1.0)));
        assert_eq!(report.metric("max"), Some(&EvaluationMetric::Float(4.0)));
        assert_eq!(report.metric("min"), Some(&EvaluationMetric::Float(-3.0)));
        assert_eq!(report.metric("pairs"), Some(&EvaluationMetric::Integer(2)));

        assert_eq!(scratch.roles, vec!["y", "y_hat"]);
        assert_eq!(scratch.files[0], vec![y.join("a.npy"), y.join("b.npy")]);
        let last = scratch.last_group.unwrap();
        assert_eq!(last.paths, vec![y.join("b.npy"), y_hat.join("b.npy")]);
        let last_y: Vec<f64> = last.records[0].as_array().unwrap().iter().copied().collect();
        assert_eq!(last_y, vec![-3.0, 4.0]);
    }

    #[test]
    fn test_missing_reconstruction_role() {
        let root = tempfile::tempdir().unwrap();
        let y = root.path().join("y");
        write(&y, "a.npy", &[1.0]);

        let config = BenchConfig::new("evaluate_y_reconstruction").with_io("y", &y);
        let err = run(&config, &mut Scratch::default()).unwrap_err();
        assert!(matches!(err, BenchError::ConfigError(_)));
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let (y, y_hat) = (root.path().join("y"), root.path().join("y_hat"));
        write(&y, "a.npy", &[1.0, 2.0]);
        write(&y_hat, "a.npy", &[1.0]);

        let config = BenchConfig::new("evaluate_y_reconstruction")
            .with_io("y", &y)
            .with_io("y_hat", &y_hat);
        let err = run(&config, &mut Scratch::default()).unwrap_err();
        assert!(matches!(err, BenchError::ShapeMismatch { .. }));
    }
}
