//! Workspace staging and scratch-space hygiene.
//!
//! The workspace only ever holds the inputs for the item currently being
//! processed. It is cleared before staging so leftovers from a previous item
//! never reach the engine; the ephemeral cache guard applies the same rule to
//! engine scratch data.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A filesystem operation that failed while preparing or cleaning state.
#[derive(Debug, Error)]
#[error("{op} {}: {source}", .path.display())]
pub struct StagingError {
    pub op: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl StagingError {
    pub(crate) fn new(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Clear every file out of `dir`, creating it when absent.
///
/// Subdirectories are left untouched; symlinks count as files.
pub fn reset_workspace(dir: &Path) -> Result<(), StagingError> {
    if !dir.exists() {
        return fs::create_dir_all(dir).map_err(|err| StagingError::new("create", dir, err));
    }
    let entries = fs::read_dir(dir).map_err(|err| StagingError::new("list", dir, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| StagingError::new("list", dir, err))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|err| StagingError::new("inspect", &path, err))?;
        if file_type.is_dir() {
            continue;
        }
        fs::remove_file(&path).map_err(|err| StagingError::new("remove", &path, err))?;
    }
    Ok(())
}

/// Copy `files` into `dir` under their own file names.
pub fn stage(dir: &Path, files: &[PathBuf]) -> Result<(), StagingError> {
    for file in files {
        let Some(name) = file.file_name() else {
            return Err(StagingError::new(
                "stage",
                file,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            ));
        };
        let dest = dir.join(name);
        fs::copy(file, &dest).map_err(|err| StagingError::new("copy", file, err))?;
    }
    Ok(())
}

/// Sorted names of the files (not directories) directly inside `dir`.
pub fn list_files(dir: &Path) -> Result<Vec<String>, StagingError> {
    let entries = fs::read_dir(dir).map_err(|err| StagingError::new("list", dir, err))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| StagingError::new("list", dir, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| StagingError::new("inspect", &entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            // Item names travel through the ledger as strings, so an
            // unrepresentable name cannot be batched.
            Err(_) => tracing::warn!(
                path = %entry.path().display(),
                "skipping file with non-UTF-8 name"
            ),
        }
    }
    names.sort();
    Ok(names)
}

/// Remove the scratch directory entirely, if present.
pub fn reset_ephemeral_cache(dir: &Path) -> Result<(), StagingError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StagingError::new("remove", dir, err)),
    }
}

/// Scoped scratch directory: cleared on acquire and again on drop.
///
/// Held for the duration of one item, so engine scratch data cannot leak into
/// the next item even when the batch aborts mid-item.
#[derive(Debug)]
pub struct EphemeralCache {
    path: PathBuf,
}

impl EphemeralCache {
    /// Clear `path` and hold it for the current item.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, StagingError> {
        let path = path.into();
        reset_ephemeral_cache(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EphemeralCache {
    fn drop(&mut self) {
        if let Err(err) = reset_ephemeral_cache(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to clear ephemeral cache");
        }
    }
}
