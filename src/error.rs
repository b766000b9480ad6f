//! Top-level batch failure taxonomy.

use thiserror::Error;

use crate::engine::EngineError;
use crate::ledger::LedgerError;
use crate::stager::StagingError;

/// Why a batch run stopped early.
///
/// The first failure always aborts the run. The variant says which stage gave
/// up; the ledger records the per-item story.
#[derive(Debug, Error)]
pub enum BatchError {
    /// No viable companion for a primary file.
    #[error("no companion match for {item}")]
    MatchNotFound { item: String },
    /// The engine ran but its report artifact did not hold up.
    #[error("verification failed for {item}: {reason}")]
    Verification { item: String, reason: String },
    /// The engine could not be run to completion.
    #[error("engine invocation failed for {item}: {source}")]
    Engine {
        item: String,
        #[source]
        source: EngineError,
    },
    /// The ledger could not be read or durably written.
    #[error("ledger persistence failed: {0}")]
    Persistence(#[from] LedgerError),
    /// Workspace or cache preparation failed.
    #[error("staging failed: {0}")]
    Staging(#[from] StagingError),
}
