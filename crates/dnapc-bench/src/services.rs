//! Contracts for the collaborators the benchmarks drive but do not own: the
//! compression model, the DNA codec, point-cloud I/O and the voxel dataset.

use crate::errors::{util::decode_error, BenchError, BenchResult};
use crate::loader::{load_file, write_points_creating_dirs, PointTable, Record};
use crate::names::extract_ext;
use crate::sequencer::visible_files;
use glob::glob_with;
use ndarray::{Array2, ArrayD, ArrayView2, ArrayViewD, IxDyn};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Analysis/synthesis transforms of the learned point-cloud compressor.
///
/// Both take a batched tensor and return a batched tensor; the batch axis is
/// the first one.
pub trait CompressionModel {
    fn analysis_transform(&self, batch: ArrayViewD<'_, f32>) -> BenchResult<ArrayD<f32>>;
    fn synthesis_transform(&self, latent: ArrayViewD<'_, f32>) -> BenchResult<ArrayD<f32>>;
}

/// Builds a model from the opaque `architecture` section of the config.
pub trait ModelBuilder {
    fn build(&self, architecture: &Value) -> BenchResult<Box<dyn CompressionModel>>;
}

/// Oligo sequences produced by the codec.
pub type Oligos = Vec<String>;

/// Knobs forwarded to the codec on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecParams {
    pub alpha: f64,
    /// Luma quantization table; `None` keeps the codec default.
    pub gammas: Option<Array2<f64>>,
    /// Chroma quantization table; `None` keeps the codec default.
    pub gammas_chroma: Option<Array2<f64>>,
    pub apply_dct: bool,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            gammas: None,
            gammas_chroma: None,
            apply_dct: true,
        }
    }
}

/// Image-to-oligo codec.
pub trait OligoCodec {
    fn encode(&self, image: ArrayView2<'_, f64>, mode: &str, params: &CodecParams)
        -> BenchResult<Oligos>;
    fn decode(&self, oligos: &Oligos, params: &CodecParams) -> BenchResult<Array2<f64>>;
}

/// Reading and writing point tables.
pub trait PointCloudIo {
    fn write(&self, path: &Path, points: &PointTable) -> BenchResult<()>;
    fn read(&self, path: &Path) -> BenchResult<PointTable>;
}

/// Point-cloud I/O through the PLY loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlyIo;

impl PointCloudIo for PlyIo {
    fn write(&self, path: &Path, points: &PointTable) -> BenchResult<()> {
        write_points_creating_dirs(path, points)
    }

    fn read(&self, path: &Path) -> BenchResult<PointTable> {
        match load_file(path)? {
            Record::Points(table) => Ok(table),
            other => Err(decode_error(
                path,
                format!("expected a point cloud, found {}", other.kind()),
            )),
        }
    }
}

/// One model input: the source file and its dense tensor.
#[derive(Debug, Clone)]
pub struct Sample {
    pub fname: PathBuf,
    pub input: ArrayD<f32>,
}

impl Sample {
    /// File stem of the source, used to name artifacts.
    pub fn name(&self) -> String {
        crate::names::extract_name(&self.fname)
    }
}

pub type SampleIter<'a> = Box<dyn Iterator<Item = BenchResult<Sample>> + 'a>;

/// Turns a directory of point clouds into model inputs.
pub trait DatasetBuilder {
    fn build(&self, dir: &Path, resolution: usize, channel_last: bool)
        -> BenchResult<Dataset<'_>>;
}

/// A sized, single-pass stream of samples.
pub struct Dataset<'a> {
    len: usize,
    samples: SampleIter<'a>,
}

impl<'a> Dataset<'a> {
    pub fn new(len: usize, samples: SampleIter<'a>) -> Self {
        Self { len, samples }
    }

    pub fn cardinality(&self) -> usize {
        self.len
    }
}

impl Iterator for Dataset<'_> {
    type Item = BenchResult<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        self.samples.next()
    }
}

/// Voxelizes every `.ply` file of a directory into a `resolution³` occupancy
/// grid, with a single channel axis placed last or first.
#[derive(Default)]
pub struct OccupancyGridDataset<I = PlyIo> {
    io: I,
}

impl<I: PointCloudIo> OccupancyGridDataset<I> {
    pub fn with_io(io: I) -> Self {
        Self { io }
    }
}

impl<I: PointCloudIo> DatasetBuilder for OccupancyGridDataset<I> {
    fn build(
        &self,
        dir: &Path,
        resolution: usize,
        channel_last: bool,
    ) -> BenchResult<Dataset<'_>> {
        if resolution == 0 {
            return Err(BenchError::ConfigError(
                "blocks.resolution must be positive".to_string(),
            ));
        }
        let files = list_point_clouds(dir)?;
        let len = files.len();
        let samples = files.into_iter().map(move |fname| {
            let points = self.io.read(&fname)?;
            let input = occupancy_grid(&points, resolution, channel_last)?;
            Ok(Sample { fname, input })
        });
        Ok(Dataset::new(len, Box::new(samples)))
    }
}

fn list_point_clouds(dir: &Path) -> BenchResult<Vec<PathBuf>> {
    let pattern = dir.join("*.ply");
    let mut files: Vec<PathBuf> = glob_with(&pattern.to_string_lossy(), visible_files())
        .map_err(|e| BenchError::ConfigError(format!("bad dataset directory: {}", e)))?
        .filter_map(Result::ok)
        .filter(|path| path.is_file() && extract_ext(path) == "ply")
        .collect();
    files.sort();
    Ok(files)
}

/// Mark every voxel that holds at least one point. Points outside
/// `[0, resolution)` on any axis are ignored.
pub fn occupancy_grid(
    points: &PointTable,
    resolution: usize,
    channel_last: bool,
) -> BenchResult<ArrayD<f32>> {
    let shape = if channel_last {
        [resolution, resolution, resolution, 1]
    } else {
        [1, resolution, resolution, resolution]
    };
    let mut grid = ArrayD::<f32>::zeros(IxDyn(&shape));
    let coordinates = points.coordinates()?;

    for point in coordinates.rows() {
        let voxel: Option<Vec<usize>> = point
            .iter()
            .map(|&c| {
                let c = c.floor();
                (c >= 0.0 && c < resolution as f64).then_some(c as usize)
            })
            .collect();
        if let Some(v) = voxel {
            let index = if channel_last {
                [v[0], v[1], v[2], 0]
            } else {
                [0, v[0], v[1], v[2]]
            };
            grid[IxDyn(&index)] = 1.0;
        }
    }
    Ok(grid)
}

/// Everything a task may call out to. Model and codec are optional because
/// they come from the embedding application.
pub struct Services {
    pub model: Option<Box<dyn ModelBuilder>>,
    pub codec: Option<Box<dyn OligoCodec>>,
    pub dataset: Box<dyn DatasetBuilder>,
    pub point_io: Box<dyn PointCloudIo>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            model: None,
            codec: None,
            dataset: Box::new(OccupancyGridDataset::<PlyIo>::default()),
            point_io: Box::new(PlyIo),
        }
    }
}

impl Services {
    pub fn with_model(mut self, model: impl ModelBuilder + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    pub fn with_codec(mut self, codec: impl OligoCodec + 'static) -> Self {
        self.codec = Some(Box::new(codec));
        self
    }

    pub fn with_dataset(mut self, dataset: impl DatasetBuilder + 'static) -> Self {
        self.dataset = Box::new(dataset);
        self
    }

    pub fn model(&self, architecture: &Value) -> BenchResult<Box<dyn CompressionModel>> {
        self.model
            .as_ref()
            .ok_or(BenchError::ServiceUnavailable("compression model"))?
            .build(architecture)
    }

    pub fn codec(&self) -> BenchResult<&dyn OligoCodec> {
        self.codec
            .as_deref()
            .ok_or(BenchError::ServiceUnavailable("oligo codec"))
    }
}
