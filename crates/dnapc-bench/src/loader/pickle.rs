use super::{Record, RecordFormat};
use crate::errors::{util::decode_error, BenchResult};
use serde_pickle::DeOptions;
use std::path::Path;

/// Python pickles, kept as a generic value tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct PickleFormat;

impl RecordFormat for PickleFormat {
    fn extension(&self) -> &'static str {
        "pkl"
    }

    fn decode(&self, path: &Path, bytes: &[u8]) -> BenchResult<Record> {
        // classes we cannot resolve (numpy reducers, dataclasses) decode to None
        let options = DeOptions::new().replace_unresolved_globals();
        serde_pickle::value_from_slice(bytes, options)
            .map(Record::Object)
            .map_err(|e| decode_error(path, e))
    }
}
