//! Resumable, strictly sequential batch processing for external media
//! analysis.
//!
//! The crate pairs each primary media file with its best companion resource,
//! stages both into a scratch workspace, runs a configured analysis engine
//! over the item, and records every state transition in a durable JSON
//! ledger. Interrupted batches resume exactly where they stopped; the first
//! failure aborts the whole run so problems are seen, not buried.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod matcher;
pub mod observer;
pub mod orchestrator;
pub mod paths;
pub mod run;
pub mod stager;
pub mod status;
mod util;

pub use config::BatchConfig;
pub use engine::{AnalysisEngine, CommandEngine, EngineError};
pub use error::BatchError;
pub use ledger::{ItemStatus, Ledger, MediaItem};
pub use matcher::MatchRules;
pub use observer::{BatchObserver, LogObserver};
pub use orchestrator::Orchestrator;
