//! Persistent batch ledger.
//!
//! One JSON document per batch records every item's lifecycle. The ledger is
//! the sole source of resume state, so saves are atomic and durable: a crash
//! mid-batch leaves either the previous ledger or the new one, never a torn
//! file.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name prefix for ledgers inside the ledger directory.
pub const LEDGER_PREFIX: &str = "batch_";
const LEDGER_EXT: &str = ".json";

/// Ledger I/O failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("list {}: {source}", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode ledger: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Lifecycle state of a single batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One primary media file tracked by the batch.
///
/// `start_time` and `end_time` are human-readable local timestamps;
/// `end_time` is only set when an item completes, so a failed record shows
/// when the attempt began and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaItem {
    pub filename: String,
    pub status: ItemStatus,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub error: Option<String>,
}

impl MediaItem {
    /// Fresh record for a file that has not been attempted yet.
    pub fn pending(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: ItemStatus::Pending,
            start_time: None,
            end_time: None,
            error: None,
        }
    }

    /// Episode token derived from the file name; never persisted.
    pub fn episode(&self) -> Option<String> {
        crate::matcher::episode_token(&self.filename)
    }
}

/// Aggregate per-status counts for a ledger.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// A batch: identity plus per-item lifecycle records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ledger {
    pub batch_id: String,
    pub videos: Vec<MediaItem>,
}

impl Ledger {
    pub fn new(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            videos: Vec::new(),
        }
    }

    /// Load the ledger at `path`, if one exists.
    ///
    /// A missing file is a clean "no prior batch" answer. Unreadable or
    /// unparseable content is an error, so a damaged ledger is never mistaken
    /// for a fresh start.
    pub fn load(path: &Path) -> Result<Option<Self>, LedgerError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LedgerError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let ledger = serde_json::from_str(&raw).map_err(|source| LedgerError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(ledger))
    }

    /// Atomically persist the ledger to `path`.
    ///
    /// The document is written to a dot-prefixed temporary sibling, fsynced,
    /// then renamed over the target. Readers only ever observe the previous
    /// or the new ledger.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let mut json =
            serde_json::to_string_pretty(self).map_err(|source| LedgerError::Encode { source })?;
        json.push('\n');

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|source| LedgerError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger.json".to_string());
        let tmp_path = parent.join(format!(".{file_name}.tmp"));

        let mut file = fs::File::create(&tmp_path).map_err(|source| LedgerError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        file.write_all(json.as_bytes())
            .map_err(|source| LedgerError::Write {
                path: tmp_path.clone(),
                source,
            })?;
        file.sync_all().map_err(|source| LedgerError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        drop(file);
        fs::rename(&tmp_path, path).map_err(|source| LedgerError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Insert or replace the record for `item.filename`, preserving order.
    pub fn upsert(&mut self, item: MediaItem) {
        match self
            .videos
            .iter_mut()
            .find(|existing| existing.filename == item.filename)
        {
            Some(existing) => *existing = item,
            None => self.videos.push(item),
        }
    }

    /// Record for `filename`, if tracked.
    pub fn find(&self, filename: &str) -> Option<&MediaItem> {
        self.videos.iter().find(|item| item.filename == filename)
    }

    pub fn find_mut(&mut self, filename: &str) -> Option<&mut MediaItem> {
        self.videos
            .iter_mut()
            .find(|item| item.filename == filename)
    }

    /// True when `filename` already completed in this batch.
    pub fn completed(&self, filename: &str) -> bool {
        self.find(filename)
            .is_some_and(|item| item.status == ItemStatus::Completed)
    }

    /// True when the batch tracked at least one item and all of them
    /// completed.
    pub fn all_completed(&self) -> bool {
        !self.videos.is_empty()
            && self
                .videos
                .iter()
                .all(|item| item.status == ItemStatus::Completed)
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for item in &self.videos {
            match item.status {
                ItemStatus::Pending => counts.pending += 1,
                ItemStatus::Processing => counts.processing += 1,
                ItemStatus::Completed => counts.completed += 1,
                ItemStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

/// New timestamp-derived batch identifier.
pub fn new_batch_id() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Human-readable timestamp for item records.
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// File name for a batch's ledger.
pub fn ledger_file_name(batch_id: &str) -> String {
    format!("{LEDGER_PREFIX}{batch_id}{LEDGER_EXT}")
}

/// Most recent resumable ledger in `dir`, by lexicographic file name.
///
/// Batch ids embed a sortable timestamp, so the greatest name is the newest.
/// A missing directory means no ledger, not an error.
pub fn latest_ledger_path(dir: &Path) -> Result<Option<PathBuf>, LedgerError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LedgerError::List {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    let mut best: Option<String> = None;
    for entry in entries {
        let entry = entry.map_err(|source| LedgerError::List {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if !name.starts_with(LEDGER_PREFIX) || !name.ends_with(LEDGER_EXT) {
            continue;
        }
        let newer = match &best {
            Some(current) => name > *current,
            None => true,
        };
        if newer {
            best = Some(name);
        }
    }
    Ok(best.map(|name| dir.join(name)))
}

/// Delete a ledger file after a fully completed batch.
pub fn remove_ledger(path: &Path) -> Result<(), LedgerError> {
    fs::remove_file(path).map_err(|source| LedgerError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
