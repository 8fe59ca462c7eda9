use super::{Record, RecordFormat};
use crate::errors::{util::decode_error, BenchResult};
use ndarray::ArrayD;
use ndarray_npy::{ReadNpyError, ReadNpyExt};
use std::path::Path;

/// NumPy `.npy` arrays, widened to `f64`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NpyFormat;

impl RecordFormat for NpyFormat {
    fn extension(&self) -> &'static str {
        "npy"
    }

    fn decode(&self, path: &Path, bytes: &[u8]) -> BenchResult<Record> {
        read_widened(bytes)
            .map(Record::Array)
            .map_err(|e| decode_error(path, e))
    }
}

/// Try each supported element type in turn; only a descriptor mismatch moves
/// on to the next one.
fn read_widened(bytes: &[u8]) -> Result<ArrayD<f64>, ReadNpyError> {
    macro_rules! attempt {
        ($ty:ty, $widen:expr) => {
            match ArrayD::<$ty>::read_npy(bytes) {
                Ok(array) => return Ok(array.mapv($widen)),
                Err(ReadNpyError::WrongDescriptor(_)) => {}
                Err(e) => return Err(e),
            }
        };
    }

    attempt!(f64, |v| v);
    attempt!(f32, f64::from);
    attempt!(i64, |v| v as f64);
    attempt!(i32, f64::from);
    attempt!(u8, f64::from);

    ArrayD::<bool>::read_npy(bytes).map(|array| array.mapv(|v| f64::from(u8::from(v))))
}
