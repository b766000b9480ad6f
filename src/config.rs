//! Batch configuration: file schema, CLI merge, validation.
//!
//! A config file only needs to override the fields it cares about; every
//! field has a default matching the conventional relative layout under the
//! working directory. Explicit CLI flags override the file in turn.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::RunArgs;

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Fallback engine watchdog, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// One batch run's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Schema version for forward compatibility checks.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Directory holding primary media files.
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,
    /// Directory holding companion resources.
    #[serde(default = "default_companion_dir")]
    pub companion_dir: PathBuf,
    /// Staging directory the engine reads from.
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
    /// Directory the engine writes report artifacts into.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    /// Directory batch ledgers are kept in.
    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: PathBuf,
    /// Engine scratch directory cleared around every item.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Explicit ledger file to resume; overrides auto-discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_path: Option<PathBuf>,
    /// Resume the most recent interrupted batch when true.
    #[serde(default = "default_true")]
    pub resume: bool,
    /// Extension of primary media files (no leading dot).
    #[serde(default = "default_primary_ext")]
    pub primary_ext: String,
    /// Extension companions must carry (no leading dot).
    #[serde(default = "default_companion_ext")]
    pub companion_ext: String,
    /// Name suffix marking the preferred companion variant.
    #[serde(default = "default_preferred_suffix")]
    pub preferred_suffix: String,
    /// Suffix appended to a primary's stem to name its report artifact.
    #[serde(default = "default_report_suffix")]
    pub report_suffix: String,
    /// Command line for the external analysis engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_command: Option<String>,
    /// Engine watchdog in seconds; null disables it.
    #[serde(default = "default_timeout")]
    pub engine_timeout_secs: Option<u64>,
    /// Items per progress chunk; processing stays strictly sequential.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            video_dir: default_video_dir(),
            companion_dir: default_companion_dir(),
            workspace: default_workspace(),
            report_dir: default_report_dir(),
            ledger_dir: default_ledger_dir(),
            cache_dir: default_cache_dir(),
            ledger_path: None,
            resume: default_true(),
            primary_ext: default_primary_ext(),
            companion_ext: default_companion_ext(),
            preferred_suffix: default_preferred_suffix(),
            report_suffix: default_report_suffix(),
            engine_command: None,
            engine_timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_schema_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("videos")
}

fn default_companion_dir() -> PathBuf {
    PathBuf::from("subtitles")
}

fn default_workspace() -> PathBuf {
    PathBuf::from("workspace")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("temp_frames")
}

fn default_true() -> bool {
    true
}

fn default_primary_ext() -> String {
    "mkv".to_string()
}

fn default_companion_ext() -> String {
    "ass".to_string()
}

fn default_preferred_suffix() -> String {
    ".scjp.ass".to_string()
}

fn default_report_suffix() -> String {
    "_ai_report.txt".to_string()
}

fn default_timeout() -> Option<u64> {
    Some(DEFAULT_TIMEOUT_SECS)
}

fn default_batch_size() -> usize {
    1
}

/// Pretty-printed starter config for `mbatch config`.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&BatchConfig::default()).context("render default config")
}

/// Read and parse a config file.
pub fn load_config(path: &Path) -> Result<BatchConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config at {}", path.display()))?;
    let config: BatchConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parse config at {}", path.display()))?;
    Ok(config)
}

/// Check the invariants a run depends on.
pub fn validate_config(config: &BatchConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} (expected {})",
            config.schema_version,
            CONFIG_SCHEMA_VERSION
        ));
    }
    if config.batch_size == 0 {
        return Err(anyhow!("batch_size must be at least 1"));
    }
    for (label, value) in [
        ("primary_ext", &config.primary_ext),
        ("companion_ext", &config.companion_ext),
    ] {
        if value.trim().is_empty() || value.starts_with('.') {
            return Err(anyhow!(
                "{label} must be a bare extension without the leading dot"
            ));
        }
    }
    if config.preferred_suffix.trim().is_empty() {
        return Err(anyhow!("preferred_suffix must not be empty"));
    }
    if config.report_suffix.trim().is_empty() {
        return Err(anyhow!("report_suffix must not be empty"));
    }
    if config.engine_timeout_secs == Some(0) {
        return Err(anyhow!(
            "engine_timeout_secs must be positive; use null to disable the watchdog"
        ));
    }
    Ok(())
}

/// Layer CLI overrides over the config file (or defaults) and validate.
pub fn resolve(args: &RunArgs) -> Result<BatchConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => BatchConfig::default(),
    };
    if let Some(dir) = &args.video_dir {
        config.video_dir = dir.clone();
    }
    if let Some(dir) = &args.companion_dir {
        config.companion_dir = dir.clone();
    }
    if let Some(dir) = &args.workspace {
        config.workspace = dir.clone();
    }
    if let Some(dir) = &args.report_dir {
        config.report_dir = dir.clone();
    }
    if let Some(dir) = &args.ledger_dir {
        config.ledger_dir = dir.clone();
    }
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(path) = &args.ledger {
        config.ledger_path = Some(path.clone());
    }
    if args.fresh {
        config.resume = false;
        config.ledger_path = None;
    }
    if let Some(command) = &args.engine {
        config.engine_command = Some(command.clone());
    }
    if let Some(secs) = args.timeout_secs {
        config.engine_timeout_secs = Some(secs);
    }
    if let Some(size) = args.batch_size {
        config.batch_size = size;
    }
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
