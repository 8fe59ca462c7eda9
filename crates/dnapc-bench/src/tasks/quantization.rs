use super::{progress_bar, BenchTask, TaskContext, TaskName};
use crate::errors::BenchResult;
use crate::metrics::{min_max, quantize_u8};
use crate::reporting::{EvaluationMetric, TaskReport};
use ndarray::Axis;
use std::time::{Duration, Instant};

/// Time the analysis transform followed by an 8-bit quantization of the
/// latent over its own value range.
#[derive(Debug, Default)]
pub struct Quantization {}

impl Quantization {
    pub fn new() -> Self {
        Quantization {}
    }
}

impl BenchTask for Quantization {
    fn name(&self) -> TaskName {
        TaskName::Quantization
    }

    fn run(&self, ctx: &mut TaskContext<'_>) -> BenchResult<TaskReport> {
        let config = ctx.config;
        let dataset = ctx.services.dataset.build(
            config.io_dir("x")?,
            config.blocks.resolution,
            config.blocks.channel_last,
        )?;
        let model = ctx.services.model(&config.architecture)?;

        let bar = progress_bar(dataset.cardinality(), config.show_progress);
        let mut samples = 0usize;
        let mut elapsed = Duration::ZERO;
        for sample in dataset {
            let sample = sample?;
            let started = Instant::now();

            let y = model.analysis_transform(sample.input.view().insert_axis(Axis(0)))?;
            if let Some((min, max)) = min_max(&y) {
                // only the cost of quantizing is of interest
                let _ = quantize_u8(y.view(), min, max);
                tracing::debug!(sample = %sample.name(), min, max, "quantized latent");
            }

            elapsed += started.elapsed();
            samples += 1;
            bar.inc(1);
        }
        bar.finish_and_clear();

        let mut report = TaskReport::new(self.name().as_str());
        report.add_metric("samples", EvaluationMetric::Integer(samples as i64));
        report.add_metric(
            "total_seconds",
            EvaluationMetric::Float(elapsed.as_secs_f64()),
        );
        let mean = if samples == 0 {
            0.0
        } else {
            elapsed.as_secs_f64() / samples as f64
        };
        report.add_metric("mean_seconds", EvaluationMetric::Float(mean));
        Ok(report)
    }
}
