//! Turning aligned path lists into decoded records.
//!
//! [`LazyRecords`] decodes one aligned group per pull and can be consumed
//! once. [`load_records`] decodes a whole list up front.

use crate::align::{align_files, zip_aligned};
use crate::bench_config::BenchConfig;
use crate::errors::{BenchError, BenchResult};
use crate::loader::{load_file, Record};
use glob::{glob_with, MatchOptions};
use rayon::prelude::*;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::vec;

/// Records of one aligned name, one per role, in role order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub paths: Vec<PathBuf>,
    pub records: Vec<Record>,
}

impl RecordGroup {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record of a single-role group.
    pub fn into_single(self) -> BenchResult<Record> {
        let count = self.records.len();
        let mut records = self.records.into_iter();
        match (records.next(), count) {
            (Some(record), 1) => Ok(record),
            _ => Err(BenchError::Other(format!(
                "expected a single record, found {}",
                count
            ))),
        }
    }

    /// Exactly `N` records, e.g. `let [y, y_hat] = group.into_array()?`.
    pub fn into_array<const N: usize>(self) -> BenchResult<[Record; N]> {
        let count = self.records.len();
        self.records.try_into().map_err(|_| {
            BenchError::Other(format!("expected {} records per group, found {}", N, count))
        })
    }
}

/// Single-pass, pull-based stream of record groups.
///
/// Each call to `next` reads and decodes every file of one group and
/// squeezes singleton axes. The sequence owns its groups, so it cannot be
/// restarted; build a new one from the same paths instead. After the first
/// error it yields nothing more.
#[derive(Debug)]
pub struct LazyRecords {
    groups: vec::IntoIter<Vec<PathBuf>>,
    failed: bool,
}

impl LazyRecords {
    pub fn new(groups: Vec<Vec<PathBuf>>) -> Self {
        Self {
            groups: groups.into_iter(),
            failed: false,
        }
    }

    /// Groups not yet pulled.
    pub fn remaining(&self) -> usize {
        if self.failed {
            0
        } else {
            self.groups.len()
        }
    }
}

impl Iterator for LazyRecords {
    type Item = BenchResult<RecordGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let paths = self.groups.next()?;
        let loaded: BenchResult<Vec<Record>> = paths
            .iter()
            .map(|path| load_file(path).map(Record::squeeze))
            .collect();

        match loaded {
            Ok(records) => Some(Ok(RecordGroup { paths, records })),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl FusedIterator for LazyRecords {}

/// Decode every file of one list, in order.
///
/// Records are squeezed the same way [`LazyRecords`] squeezes them, so
/// reading a lazy sequence to the end gives the same records.
pub fn load_records(paths: &[PathBuf]) -> BenchResult<Vec<Record>> {
    paths
        .iter()
        .map(|path| load_file(path).map(Record::squeeze))
        .collect()
}

/// Same as [`load_records`] but decodes on the rayon pool. Output order
/// matches input order.
pub fn load_records_parallel(paths: &[PathBuf]) -> BenchResult<Vec<Record>> {
    paths
        .par_iter()
        .map(|path| load_file(path).map(Record::squeeze))
        .collect()
}

/// `*` must not match dotfiles such as `.gitkeep`.
pub(crate) fn visible_files() -> MatchOptions {
    MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    }
}

/// Sorted regular files of a directory, hidden files left out.
pub fn list_directory(dir: &Path) -> BenchResult<Vec<PathBuf>> {
    let pattern = dir.join("*");
    let mut files: Vec<PathBuf> = glob_with(&pattern.to_string_lossy(), visible_files())
        .map_err(|e| BenchError::ConfigError(format!("Invalid directory {}: {}", dir.display(), e)))?
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Aligned path lists for every configured role not in `exceptions`.
///
/// Returns the role labels alongside their lists, in declaration order.
pub fn aligned_io_files(
    config: &BenchConfig,
    exceptions: &[&str],
) -> BenchResult<(Vec<String>, Vec<Vec<PathBuf>>)> {
    let roles = config.roles(exceptions);
    if roles.is_empty() {
        return Err(BenchError::AlignmentError(format!(
            "No io directory left to load after excluding {:?}",
            exceptions
        )));
    }

    let mut listings = Vec::with_capacity(roles.len());
    for role in &roles {
        let listing = list_directory(role.path)?;
        if listing.is_empty() {
            return Err(BenchError::ConfigError(format!(
                "Directory for io.{} is missing or empty: {}",
                role.label,
                role.path.display()
            )));
        }
        listings.push(listing);
    }

    let aligned = align_files(&listings)?;
    tracing::info!(
        roles = ?roles.iter().map(|r| r.label).collect::<Vec<_>>(),
        records = aligned.first().map(Vec::len).unwrap_or(0),
        "aligned io directories"
    );
    let labels = roles.iter().map(|r| r.label.to_string()).collect();
    Ok((labels, aligned))
}

/// Lazy record groups over every configured role not in `exceptions`.
pub fn load_io_files(config: &BenchConfig, exceptions: &[&str]) -> BenchResult<LazyRecords> {
    let (_, aligned) = aligned_io_files(config, exceptions)?;
    Ok(LazyRecords::new(zip_aligned(aligned)))
}
