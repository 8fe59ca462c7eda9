use super::{BenchTask, TaskContext, TaskName};
use crate::errors::BenchResult;
use crate::metrics::mse;
use crate::reporting::{EvaluationMetric, TaskReport};
use crate::services::{CodecParams, OligoCodec};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const IMAGE_SIDE: usize = 64;
const TABLE_SIDE: usize = 8;
const ENCODE_MODE: &str = "from_img";

/// Encode a random 8-bit image through the oligo codec under different
/// quantization tables and compare the reconstructions.
#[derive(Debug, Default)]
pub struct QuantizationTables {}

impl QuantizationTables {
    pub fn new() -> Self {
        QuantizationTables {}
    }

    /// The parameter sets compared, by label.
    pub fn runs() -> Vec<(&'static str, CodecParams)> {
        let ones = Array2::<f64>::ones((TABLE_SIDE, TABLE_SIDE));
        vec![
            ("default", CodecParams::default()),
            (
                "default_no_dct",
                CodecParams {
                    apply_dct: false,
                    ..CodecParams::default()
                },
            ),
            (
                "ones",
                CodecParams {
                    gammas: Some(ones.clone()),
                    gammas_chroma: Some(ones),
                    ..CodecParams::default()
                },
            ),
        ]
    }
}

impl BenchTask for QuantizationTables {
    fn name(&self) -> TaskName {
        TaskName::QuantizationTables
    }

    fn run(&self, ctx: &mut TaskContext<'_>) -> BenchResult<TaskReport> {
        let codec = ctx.services.codec()?;
        let image = random_image(ctx.config.seed);

        let mut report = TaskReport::new(self.name().as_str());
        for (label, params) in Self::runs() {
            let (error, oligos) = round_trip(codec, &image, &params)?;
            tracing::info!(run = label, mse = error, oligos, "codec round trip");
            report.add_metric(format!("mse_{}", label), EvaluationMetric::Float(error));
            report.add_metric(
                format!("oligos_{}", label),
                EvaluationMetric::Integer(oligos as i64),
            );
        }
        Ok(report)
    }
}

/// A square image of whole numbers in `[0, 255]`.
pub(crate) fn random_image(seed: Option<u64>) -> Array2<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Array2::from_shape_fn((IMAGE_SIDE, IMAGE_SIDE), |_| {
        (rng.gen::<f64>() * 255.0).round()
    })
}

/// Encode then decode `image`, returning the reconstruction error and the
/// number of oligos used.
fn round_trip(
    codec: &dyn OligoCodec,
    image: &Array2<f64>,
    params: &CodecParams,
) -> BenchResult<(f64, usize)> {
    let oligos = codec.encode(image.view(), ENCODE_MODE, params)?;
    let decoded = codec.decode(&oligos, params)?;
    let error = mse(image.view().into_dyn(), decoded.view().into_dyn())?;
    Ok((error, oligos.len()))
}
