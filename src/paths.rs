//! Canonical filesystem layout for a batch run.
//!
//! Path math lives here so the rest of the crate asks for locations by
//! meaning instead of rebuilding join chains inline.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BatchConfig;
use crate::ledger;
use crate::stager::StagingError;

/// Every location a batch touches, derived once from configuration.
#[derive(Debug, Clone)]
pub struct BatchPaths {
    video_dir: PathBuf,
    companion_dir: PathBuf,
    workspace: PathBuf,
    report_dir: PathBuf,
    ledger_dir: PathBuf,
    cache_dir: PathBuf,
}

impl BatchPaths {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            video_dir: config.video_dir.clone(),
            companion_dir: config.companion_dir.clone(),
            workspace: config.workspace.clone(),
            report_dir: config.report_dir.clone(),
            ledger_dir: config.ledger_dir.clone(),
            cache_dir: config.cache_dir.clone(),
        }
    }

    pub fn video_dir(&self) -> &Path {
        &self.video_dir
    }

    pub fn companion_dir(&self) -> &Path {
        &self.companion_dir
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub fn ledger_dir(&self) -> &Path {
        &self.ledger_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Ledger file for a batch id.
    pub fn ledger_path(&self, batch_id: &str) -> PathBuf {
        self.ledger_dir.join(ledger::ledger_file_name(batch_id))
    }

    /// Create the directories the batch writes into.
    ///
    /// Input directories are not created; a missing one fails loudly on
    /// first use instead of silently yielding an empty batch.
    pub fn ensure_directories(&self) -> Result<(), StagingError> {
        for dir in [&self.workspace, &self.report_dir, &self.ledger_dir] {
            fs::create_dir_all(dir).map_err(|err| StagingError::new("create", dir, err))?;
        }
        Ok(())
    }
}
