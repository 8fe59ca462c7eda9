//! Canonical file identities.
//!
//! Files in different role directories belong to the same record when their
//! base names match, whatever their directory or extension. Everything here
//! works on the path text alone and never touches the filesystem.

use std::path::{Path, PathBuf};

/// Identity of a file as seen by the aligner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub base_name: String,
    pub extension: String,
    pub parent_path: PathBuf,
}

impl FileIdentity {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        FileIdentity {
            base_name: extract_name(path),
            extension: extract_ext(path),
            parent_path: PathBuf::from(extract_path(path)),
        }
    }

    /// Another record in the same directory with the same extension.
    pub fn renamed(&self, base_name: &str) -> PathBuf {
        with_name(&self.parent_path, base_name, &self.extension)
    }
}

/// Everything before the last path separator, `"."` for a bare file name.
pub fn extract_path<P: AsRef<Path>>(path: P) -> String {
    match path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    }
}

/// The text after the final `.` of the file name.
pub fn extract_ext<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The file name without its directory and final extension.
pub fn extract_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build `{parent}/{name}.{extension}`; the dot is left out for an empty extension.
pub fn with_name<P: AsRef<Path>>(parent: P, name: &str, extension: &str) -> PathBuf {
    let file_name = if extension.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", name, extension)
    };
    parent.as_ref().join(file_name)
}
