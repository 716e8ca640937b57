use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::{LedgerError, RejectionReason};

use super::amount::AmountError;
use super::step::StepId;

/// Terminal failure of a single workflow step.
///
/// `InvalidAmount` and `DependencyUnresolved` are raised before any remote
/// call. `Rejected`, `Network`, and `Timeout` come back from the ledger and
/// abort the run at the current step; earlier confirmed results are kept.
/// Nothing here is retried automatically; retry policy belongs to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StepError {
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("step '{step}' depends on output of '{missing}', which has not confirmed")]
    DependencyUnresolved { step: StepId, missing: StepId },

    #[error("rejected by ledger: {0}")]
    Rejected(RejectionReason),

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("operation '{operation}' timed out after {duration_ms}ms; outcome unknown")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("run cancelled before this step was submitted")]
    Cancelled,
}

impl StepError {
    /// Stable short name for logs and serialized results.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::InvalidAmount(_) => "invalid-amount",
            StepError::DependencyUnresolved { .. } => "dependency-unresolved",
            StepError::Rejected(_) => "remote-rejected",
            StepError::Network(_) => "network",
            StepError::Timeout { .. } => "timeout",
            StepError::Cancelled => "cancelled",
        }
    }
}

impl From<LedgerError> for StepError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NetworkUnreachable(msg) => StepError::Network(msg),
            LedgerError::Rejected(reason) => StepError::Rejected(reason),
            LedgerError::Timeout {
                operation,
                duration_ms,
            } => StepError::Timeout {
                operation,
                duration_ms,
            },
        }
    }
}
