use super::{progress_bar, BenchTask, TaskContext, TaskName};
use crate::errors::{BenchError, BenchResult};
use crate::loader::PointTable;
use crate::reporting::{EvaluationMetric, TaskReport};
use ndarray::{Array2, ArrayD, Axis, Dimension};
use std::collections::BTreeSet;
use std::fs;

const OCCUPANCY_THRESHOLD: f32 = 0.5;

/// Skip the oligo stage entirely: run every block of `io.x` through the
/// model's analysis and synthesis transforms and write the reconstructed
/// point clouds.
#[derive(Debug, Default)]
pub struct BypassDna {}

impl BypassDna {
    pub fn new() -> Self {
        BypassDna {}
    }
}

impl BenchTask for BypassDna {
    fn name(&self) -> TaskName {
        TaskName::BypassDna
    }

    fn run(&self, ctx: &mut TaskContext<'_>) -> BenchResult<TaskReport> {
        let config = ctx.config;
        let dataset = ctx.services.dataset.build(
            config.io_dir("x")?,
            config.blocks.resolution,
            config.blocks.channel_last,
        )?;
        let model = ctx.services.model(&config.architecture)?;

        let out_dir = config.output_dir.join("bypass_dna").join("x_hat");
        fs::create_dir_all(&out_dir)?;

        let mut report = TaskReport::new(self.name().as_str());
        let bar = progress_bar(dataset.cardinality(), config.show_progress);
        for sample in dataset {
            let sample = sample?;
            let name = sample.name();

            let y = model.analysis_transform(sample.input.view().insert_axis(Axis(0)))?;
            let x_hat = model.synthesis_transform(y.view())?;
            if x_hat.ndim() == 0 || x_hat.len_of(Axis(0)) == 0 {
                return Err(BenchError::ServiceError(format!(
                    "synthesis transform returned an empty batch for {}",
                    name
                )));
            }
            let x_hat = x_hat.index_axis_move(Axis(0), 0);

            let points = occupied_points(&x_hat, config.blocks.channel_last)?;
            let path = out_dir.join(format!("{}.ply", name));
            ctx.services.point_io.write(&path, &points)?;
            tracing::debug!(path = %path.display(), points = points.len(), "wrote reconstruction");

            report.add_artifact(path);
            bar.inc(1);
        }
        bar.finish_and_clear();

        report.add_metric(
            "samples",
            EvaluationMetric::Integer(report.artifacts.len() as i64),
        );
        Ok(report)
    }
}

/// Coordinates of every voxel above the occupancy threshold.
///
/// A 4-d grid carries one channel axis, last or first; a voxel counts as
/// occupied when any of its channels does.
pub(crate) fn occupied_points(grid: &ArrayD<f32>, channel_last: bool) -> BenchResult<PointTable> {
    let spatial = match (grid.ndim(), channel_last) {
        (3, _) => 0..3,
        (4, true) => 0..3,
        (4, false) => 1..4,
        _ => {
            return Err(BenchError::ShapeMismatch {
                expected: vec![0, 0, 0],
                actual: grid.shape().to_vec(),
            })
        }
    };

    let occupied: BTreeSet<[usize; 3]> = grid
        .indexed_iter()
        .filter(|(_, &value)| value > OCCUPANCY_THRESHOLD)
        .map(|(index, _)| {
            let index = &index.slice()[spatial.clone()];
            [index[0], index[1], index[2]]
        })
        .collect();

    let mut data = Array2::<f64>::zeros((occupied.len(), 3));
    for (row, voxel) in occupied.iter().enumerate() {
        for (col, &c) in voxel.iter().enumerate() {
            data[[row, col]] = c as f64;
        }
    }
    Ok(PointTable::from_coordinates(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench_config::BenchConfig;
    use crate::loader::{load_file, write_points};
    use crate::services::{CompressionModel, ModelBuilder, Services};
    use crate::tasks::Scratch;
    use mockall::mock;
    use ndarray::{array, ArrayViewD, IxDyn};
    use serde_json::{json, Value};

    mock! {
        Builder {}
        impl ModelBuilder for Builder {
            fn build(&self, architecture: &Value) -> BenchResult<Box<dyn CompressionModel>>;
        }
    }

    /// Passes blocks through unchanged.
    struct Identity;

    impl CompressionModel for Identity {
        fn analysis_transform(&self, batch: ArrayViewD<'_, f32>) -> BenchResult<ArrayD<f32>> {
            Ok(batch.to_owned())
        }

        fn synthesis_transform(&self, latent: ArrayViewD<'_, f32>) -> BenchResult<ArrayD<f32>> {
            Ok(latent.to_owned())
        }
    }

    #[test]
    fn test_reconstructions_are_written_per_block() {
        let root = tempfile::tempdir().unwrap();
        let x = root.path().join("x");
        std::fs::create_dir_all(&x).unwrap();
        let cloud = PointTable::from_coordinates(array![[0.0, 1.0, 2.0], [3.0, 3.0, 3.0]]);
        write_points(x.join("block_0.ply"), &cloud).unwrap();

        let mut builder = MockBuilder::new();
        builder
            .expect_build()
            .withf(|architecture| architecture["filters"] == 8)
            .times(1)
            .returning(|_| Ok(Box::new(Identity)));
        let services = Services::default().with_model(builder);

        let mut config = BenchConfig::new("bypass_dna").with_io("x", &x);
        config.blocks.resolution = 4;
        config.output_dir = root.path().join("out");
        config.architecture = json!({ "filters": 8 });
        config.show_progress = false;

        let mut scratch = Scratch::default();
        let mut ctx = TaskContext {
            config: &config,
            services: &services,
            scratch: &mut scratch,
        };
        let report = BypassDna::new().run(&mut ctx).unwrap();

        let written = root.path().join("out/bypass_dna/x_hat/block_0.ply");
        assert_eq!(report.artifacts, vec![written.clone()]);
        assert_eq!(report.metric("samples"), Some(&EvaluationMetric::Integer(1)));
        let reloaded = load_file(&written).unwrap();
        assert_eq!(reloaded.as_points().unwrap().data(), cloud.data());
    }

    #[test]
    fn test_missing_model_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let config = BenchConfig::new("bypass_dna").with_io("x", root.path());
        let services = Services::default();
        let mut scratch = Scratch::default();
        let mut ctx = TaskContext {
            config: &config,
            services: &services,
            scratch: &mut scratch,
        };
        assert!(matches!(
            BypassDna::new().run(&mut ctx),
            Err(BenchError::ServiceUnavailable("compression model"))
        ));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut grid = ArrayD::<f32>::zeros(IxDyn(&[2, 2, 2, 1]));
        grid[IxDyn(&[1, 0, 1, 0])] = 0.9;
        grid[IxDyn(&[0, 1, 0, 0])] = 0.5;

        let points = occupied_points(&grid, true).unwrap();
        assert_eq!(points.data(), &array![[1.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_channel_first_grid() {
        let mut grid = ArrayD::<f32>::zeros(IxDyn(&[1, 3, 3, 3]));
        grid[IxDyn(&[0, 2, 1, 0])] = 1.0;
        let points = occupied_points(&grid, false).unwrap();
        assert_eq!(points.data(), &array![[2.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_rejects_flat_tensor() {
        let grid = ArrayD::<f32>::zeros(IxDyn(&[8]));
        assert!(occupied_points(&grid, true).is_err());
    }
}
