//! Extension-driven decoding of benchmark files.
//!
//! Each recognized extension maps to one [`RecordFormat`]. The table is
//! closed: anything it does not list is rejected with
//! [`BenchError::UnsupportedFormat`] before the file is read.

mod npy;
mod pickle;
mod ply;
mod record;

pub use npy::NpyFormat;
pub use pickle::PickleFormat;
pub use ply::{write_points, PlyFormat};
pub(crate) use ply::write_points_creating_dirs;
pub use record::{PointTable, Record};

use crate::errors::{BenchError, BenchResult};
use crate::names::extract_ext;
use std::fs;
use std::path::Path;

/// Decoder for one on-disk format.
pub trait RecordFormat: Send + Sync {
    /// Extension handled by this format, without the dot.
    fn extension(&self) -> &'static str;

    /// Decode the full contents of `path`, already read into memory.
    fn decode(&self, path: &Path, bytes: &[u8]) -> BenchResult<Record>;
}

static NPY: &dyn RecordFormat = &NpyFormat;
static PICKLE: &dyn RecordFormat = &PickleFormat;
static PLY: &dyn RecordFormat = &PlyFormat;

/// Every format the loader understands.
pub fn supported_formats() -> [&'static dyn RecordFormat; 3] {
    [NPY, PICKLE, PLY]
}

pub fn format_for_extension(extension: &str) -> Option<&'static dyn RecordFormat> {
    supported_formats()
        .into_iter()
        .find(|format| format.extension() == extension)
}

/// Load one file, choosing the decoder from its extension.
///
/// The file is read exactly once and nothing is cached between calls.
pub fn load_file<P: AsRef<Path>>(path: P) -> BenchResult<Record> {
    let path = path.as_ref();
    let extension = extract_ext(path);
    let format =
        format_for_extension(&extension).ok_or_else(|| BenchError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: extension.clone(),
        })?;

    let bytes = fs::read(path)?;
    tracing::trace!(path = %path.display(), bytes = bytes.len(), "decoding {}", extension);
    format.decode(path, &bytes)
}
