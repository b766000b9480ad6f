//! Shared test infrastructure for integration tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use media_batch::config::BatchConfig;
use media_batch::engine::{report_artifact_name, AnalysisEngine, EngineError};
use media_batch::ledger::ItemStatus;
use media_batch::observer::BatchObserver;

/// Self-contained batch layout rooted in a temporary directory.
///
/// Only the input directories exist up front; the orchestrator is expected to
/// create the workspace, report, and ledger directories itself.
pub struct BatchFixture {
    pub root: TempDir,
    pub config: BatchConfig,
}

impl BatchFixture {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create fixture root");
        let base = root.path();
        let config = BatchConfig {
            video_dir: base.join("videos"),
            companion_dir: base.join("subtitles"),
            workspace: base.join("workspace"),
            report_dir: base.join("reports"),
            ledger_dir: base.join("logs"),
            cache_dir: base.join("temp_frames"),
            ..BatchConfig::default()
        };
        fs::create_dir_all(&config.video_dir).expect("create video dir");
        fs::create_dir_all(&config.companion_dir).expect("create companion dir");
        Self { root, config }
    }

    pub fn add_video(&self, name: &str) {
        fs::write(self.config.video_dir.join(name), b"video bytes").expect("write video");
    }

    pub fn add_companion(&self, name: &str) {
        fs::write(self.config.companion_dir.join(name), b"companion bytes")
            .expect("write companion");
    }

    /// Expected report artifact path for a primary file name.
    pub fn report_path(&self, primary: &str) -> PathBuf {
        self.config
            .report_dir
            .join(report_artifact_name(primary, &self.config.report_suffix))
    }

    /// Sorted file names in the ledger directory, empty when it is absent.
    pub fn ledger_files(&self) -> Vec<String> {
        sorted_names(&self.config.ledger_dir)
    }

    /// Sorted file names in the workspace, empty when it is absent.
    pub fn workspace_files(&self) -> Vec<String> {
        sorted_names(&self.config.workspace)
    }
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut names: Vec<String> = entries
        .map(|entry| entry.expect("read dir entry"))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

/// Engine double driven by a per-item script.
///
/// Each invocation records the sorted workspace listing, then asks the script
/// what to leave behind for the staged primary: `Some(bytes)` writes those
/// bytes as the report artifact, `None` writes nothing. The artifact path is
/// returned either way, exactly like an engine that is not trusted.
pub struct ScriptedEngine {
    report_dir: PathBuf,
    report_suffix: String,
    primary_ext: String,
    script: Box<dyn Fn(&str) -> Option<Vec<u8>> + Send + Sync>,
    pub invocations: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedEngine {
    pub fn with_script(
        config: &BatchConfig,
        script: impl Fn(&str) -> Option<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            report_dir: config.report_dir.clone(),
            report_suffix: config.report_suffix.clone(),
            primary_ext: config.primary_ext.clone(),
            script: Box::new(script),
            invocations: Arc::default(),
        }
    }

    /// Engine that writes a plausible report for every item.
    pub fn succeeding(config: &BatchConfig) -> Self {
        Self::with_script(config, |_| Some(b"frame-by-frame analysis\n".to_vec()))
    }
}

impl AnalysisEngine for ScriptedEngine {
    fn run_analysis(&self, workspace: &Path) -> Result<PathBuf, EngineError> {
        let names = sorted_names(workspace);
        self.invocations
            .lock()
            .expect("invocations lock")
            .push(names.clone());

        let wanted = format!(".{}", self.primary_ext);
        let primary = names
            .iter()
            .find(|name| name.ends_with(&wanted))
            .expect("a primary is always staged");
        let artifact = self
            .report_dir
            .join(report_artifact_name(primary, &self.report_suffix));
        if let Some(bytes) = (self.script)(primary) {
            fs::create_dir_all(&self.report_dir).expect("create report dir");
            fs::write(&artifact, bytes).expect("write report artifact");
        }
        Ok(artifact)
    }
}

/// Engine double that never manages to launch.
pub struct FailingEngine;

impl AnalysisEngine for FailingEngine {
    fn run_analysis(&self, _workspace: &Path) -> Result<PathBuf, EngineError> {
        Err(EngineError::Spawn {
            program: "frame-analyzer".to_string(),
            source: io::Error::other("engine crashed before launch"),
        })
    }
}

/// One observed lifecycle event, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Ended(String, ItemStatus),
    Aborted(String, String),
}

/// Observer that appends every event to a shared log.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Arc<Mutex<Vec<Event>>>,
}

impl BatchObserver for RecordingObserver {
    fn on_item_start(&self, filename: &str) {
        self.events
            .lock()
            .expect("events lock")
            .push(Event::Started(filename.to_string()));
    }

    fn on_item_end(&self, filename: &str, status: ItemStatus) {
        self.events
            .lock()
            .expect("events lock")
            .push(Event::Ended(filename.to_string(), status));
    }

    fn on_batch_abort(&self, filename: &str, reason: &str) {
        self.events
            .lock()
            .expect("events lock")
            .push(Event::Aborted(filename.to_string(), reason.to_string()));
    }
}

/// Snapshot of the events recorded so far.
pub fn recorded_events(handle: &Arc<Mutex<Vec<Event>>>) -> Vec<Event> {
    handle.lock().expect("events lock").clone()
}
