use crate::errors::{BenchError, BenchResult};
use ndarray::{ArrayBase, ArrayD, ArrayViewD, Data, Dimension, Zip};
use serde::Serialize;

pub const HISTOGRAM_BINS: usize = 64;

/// TensorFlow keeps at least this much width in a quantization range.
const MIN_QUANTIZE_RANGE: f32 = 0.01;

/// Mean squared error between two arrays of the same shape.
pub fn mse(a: ArrayViewD<'_, f64>, b: ArrayViewD<'_, f64>) -> BenchResult<f64> {
    if a.shape() != b.shape() {
        return Err(BenchError::ShapeMismatch {
            expected: a.shape().to_vec(),
            actual: b.shape().to_vec(),
        });
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    let sum = Zip::from(&a)
        .and(&b)
        .fold(0.0, |acc, &x, &y| acc + (x - y).powi(2));
    Ok(sum / a.len() as f64)
}

/// Smallest and largest element, `None` for an empty array.
pub fn min_max<S, D>(array: &ArrayBase<S, D>) -> Option<(S::Elem, S::Elem)>
where
    S: Data,
    S::Elem: Copy + PartialOrd,
    D: Dimension,
{
    let mut iter = array.iter().copied();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| {
        (
            if v < lo { v } else { lo },
            if v > hi { v } else { hi },
        )
    }))
}

/// Running sum of squared differences across many pairs.
#[derive(Debug, Default, Clone, Copy)]
pub struct MseAccumulator {
    sum: f64,
    count: usize,
}

impl MseAccumulator {
    pub fn add(&mut self, a: ArrayViewD<'_, f64>, b: ArrayViewD<'_, f64>) -> BenchResult<()> {
        let pair = mse(a.view(), b.view())?;
        self.sum += pair * a.len() as f64;
        self.count += a.len();
        Ok(())
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Map `values` onto `0..=255` over `[min, max]`, MIN_COMBINED style.
pub fn quantize_u8(values: ArrayViewD<'_, f32>, min: f32, max: f32) -> ArrayD<u8> {
    let max = max.max(min + MIN_QUANTIZE_RANGE);
    let scale = 255.0 / (max - min);
    values.mapv(|v| ((v.clamp(min, max) - min) * scale).round() as u8)
}

/// Equal-width histogram of a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn from_values<I>(label: impl Into<String>, values: I, bins: usize) -> Self
    where
        I: IntoIterator<Item = f64> + Clone,
    {
        let (min, max) = values
            .clone()
            .into_iter()
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 0.0));

        let mut counts = vec![0u64; bins.max(1)];
        let width = (max - min) / counts.len() as f64;
        for v in values {
            let bin = if width > 0.0 {
                (((v - min) / width) as usize).min(counts.len() - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }

        Self {
            label: label.into(),
            min,
            max,
            counts,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
