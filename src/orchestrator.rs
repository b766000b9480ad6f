//! Sequential batch orchestration.
//!
//! One item at a time: reset, checkpoint, match, stage, analyze, verify,
//! persist. The ledger is written before the engine runs and after every
//! terminal transition, so an interrupted batch resumes exactly where it
//! stopped. The first failure aborts the whole run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::BatchConfig;
use crate::engine::{self, AnalysisEngine};
use crate::error::BatchError;
use crate::ledger::{self, ItemStatus, Ledger, MediaItem};
use crate::matcher::{self, MatchRules};
use crate::observer::{BatchObserver, LogObserver};
use crate::paths::BatchPaths;
use crate::stager::{self, EphemeralCache};
use crate::util::has_extension;

/// Drives one batch to completion or first failure.
pub struct Orchestrator {
    config: BatchConfig,
    paths: BatchPaths,
    rules: MatchRules,
    engine: Box<dyn AnalysisEngine>,
    observer: Box<dyn BatchObserver>,
}

impl Orchestrator {
    pub fn new(config: BatchConfig, engine: Box<dyn AnalysisEngine>) -> Self {
        let paths = BatchPaths::new(&config);
        let rules = MatchRules {
            companion_ext: config.companion_ext.clone(),
            preferred_suffix: config.preferred_suffix.clone(),
        };
        Self {
            config,
            paths,
            rules,
            engine,
            observer: Box::new(LogObserver),
        }
    }

    /// Replace the default logging observer.
    pub fn with_observer(mut self, observer: Box<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run the batch: every primary in sorted order, stopping at the first
    /// failure.
    ///
    /// On full success the ledger file is deleted; any abort leaves it behind
    /// for the next run to resume from.
    pub fn run(&self) -> Result<(), BatchError> {
        self.paths.ensure_directories()?;
        stager::reset_ephemeral_cache(self.paths.cache_dir())?;

        let (mut batch, ledger_path) = self.resolve_ledger()?;
        let primaries = self.enumerate_primaries()?;
        tracing::info!(
            batch_id = %batch.batch_id,
            count = primaries.len(),
            video_dir = %self.paths.video_dir().display(),
            "starting batch"
        );
        if primaries.is_empty() {
            tracing::info!("no primary media files found; nothing to do");
        }

        let chunk_size = self.config.batch_size.max(1);
        for (index, chunk) in primaries.chunks(chunk_size).enumerate() {
            tracing::debug!(chunk = index + 1, size = chunk.len(), "processing chunk");
            for primary in chunk {
                if let Err(err) = self.process_item(&mut batch, &ledger_path, primary) {
                    self.observer.on_batch_abort(primary, &err.to_string());
                    tracing::error!(item = %primary, error = %err, "batch aborted");
                    return Err(err);
                }
            }
        }

        if batch.all_completed() {
            ledger::remove_ledger(&ledger_path)?;
            tracing::info!(batch_id = %batch.batch_id, "batch complete; ledger removed");
        }
        Ok(())
    }

    /// Decide which ledger this run continues or creates.
    ///
    /// An explicit path beats discovery; discovery picks the newest
    /// `batch_*.json` unless resume is disabled; otherwise a fresh
    /// timestamped batch begins.
    fn resolve_ledger(&self) -> Result<(Ledger, PathBuf), BatchError> {
        let explicit = self.config.ledger_path.clone();
        let discovered = if explicit.is_none() && self.config.resume {
            ledger::latest_ledger_path(self.paths.ledger_dir())?
        } else {
            None
        };
        let path = match explicit.or(discovered) {
            Some(path) => path,
            None => {
                let batch_id = ledger::new_batch_id();
                let path = self.paths.ledger_path(&batch_id);
                tracing::info!(batch_id = %batch_id, "starting fresh batch");
                return Ok((Ledger::new(batch_id), path));
            }
        };
        match Ledger::load(&path)? {
            Some(batch) => {
                tracing::info!(
                    batch_id = %batch.batch_id,
                    ledger = %path.display(),
                    completed = batch.counts().completed,
                    tracked = batch.videos.len(),
                    "resuming batch"
                );
                Ok((batch, path))
            }
            None => {
                let batch_id = ledger::new_batch_id();
                tracing::info!(
                    batch_id = %batch_id,
                    ledger = %path.display(),
                    "no ledger at requested path; starting fresh"
                );
                Ok((Ledger::new(batch_id), path))
            }
        }
    }

    /// Sorted primary file names in the video directory.
    fn enumerate_primaries(&self) -> Result<Vec<String>, BatchError> {
        let names = stager::list_files(self.paths.video_dir())?;
        Ok(names
            .into_iter()
            .filter(|name| has_extension(name, &self.config.primary_ext))
            .collect())
    }

    fn process_item(
        &self,
        batch: &mut Ledger,
        ledger_path: &Path,
        primary: &str,
    ) -> Result<(), BatchError> {
        if batch.completed(primary) {
            tracing::info!(item = %primary, "already completed; skipping");
            return Ok(());
        }
        let started = Instant::now();
        self.observer.on_item_start(primary);

        stager::reset_workspace(self.paths.workspace())?;
        let _cache = EphemeralCache::acquire(self.paths.cache_dir())?;

        // Durable checkpoint before any external work: a crash from here on
        // resumes this item as interrupted, not silently skipped.
        batch.upsert(MediaItem {
            filename: primary.to_string(),
            status: ItemStatus::Processing,
            start_time: Some(ledger::now_timestamp()),
            end_time: None,
            error: None,
        });
        batch.save(ledger_path)?;

        let candidates = stager::list_files(self.paths.companion_dir())?;
        let Some(companion) = matcher::select_best_match(primary, &candidates, &self.rules)
        else {
            let reason = format!("no companion match for {primary}");
            return self.fail_item(
                batch,
                ledger_path,
                primary,
                reason,
                BatchError::MatchNotFound {
                    item: primary.to_string(),
                },
            );
        };
        tracing::info!(item = %primary, companion = %companion, "matched companion");

        stager::stage(
            self.paths.workspace(),
            &[
                self.paths.video_dir().join(primary),
                self.paths.companion_dir().join(companion),
            ],
        )?;

        let artifact = match self.engine.run_analysis(self.paths.workspace()) {
            Ok(artifact) => artifact,
            Err(err) => {
                let reason = format!("engine invocation failed: {err}");
                return self.fail_item(
                    batch,
                    ledger_path,
                    primary,
                    reason,
                    BatchError::Engine {
                        item: primary.to_string(),
                        source: err,
                    },
                );
            }
        };

        match engine::verify_artifact(&artifact) {
            Ok(size) => {
                tracing::info!(
                    item = %primary,
                    artifact = %artifact.display(),
                    size,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "item completed"
                );
                stager::reset_workspace(self.paths.workspace())?;
                if let Some(record) = batch.find_mut(primary) {
                    record.status = ItemStatus::Completed;
                    record.end_time = Some(ledger::now_timestamp());
                }
                batch.save(ledger_path)?;
                self.observer.on_item_end(primary, ItemStatus::Completed);
                Ok(())
            }
            Err(reason) => self.fail_item(
                batch,
                ledger_path,
                primary,
                reason.clone(),
                BatchError::Verification {
                    item: primary.to_string(),
                    reason,
                },
            ),
        }
    }

    /// Record a failure durably, emit the item event, and surface the abort.
    ///
    /// The workspace is intentionally left staged so the failed inputs can be
    /// inspected; only the ledger and the cache guard are touched.
    fn fail_item(
        &self,
        batch: &mut Ledger,
        ledger_path: &Path,
        primary: &str,
        reason: String,
        error: BatchError,
    ) -> Result<(), BatchError> {
        if let Some(record) = batch.find_mut(primary) {
            record.status = ItemStatus::Failed;
            record.error = Some(reason);
        }
        batch.save(ledger_path)?;
        self.observer.on_item_end(primary, ItemStatus::Failed);
        Err(error)
    }
}
