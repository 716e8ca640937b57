use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::Address;

/// Why the backing network refused a submitted operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RejectionReason {
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: u64, required: u64 },

    #[error("insufficient delegate allowance: remaining {remaining}, required {required}")]
    InsufficientAllowance { remaining: u64, required: u64 },

    #[error("no active delegate on account {account}")]
    NoActiveDelegate { account: Address },

    #[error("unknown token account {0}")]
    UnknownAccount(Address),

    #[error("unknown mint {0}")]
    UnknownMint(Address),

    #[error("account {account} does not hold mint {mint}")]
    MintMismatch { account: Address, mint: Address },

    #[error("authority {authority} is not permitted to {action}")]
    BadAuthority { authority: Address, action: String },

    #[error("supply or balance arithmetic overflow")]
    SupplyOverflow,
}

/// Failure modes of a single ledger operation.
///
/// `Timeout` is deliberately distinct from `Rejected`: a timed-out
/// submission has an unknown outcome and callers must not assume it
/// either settled or failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LedgerError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rejected by ledger: {0}")]
    Rejected(#[from] RejectionReason),

    #[error("ledger operation '{operation}' timed out after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },
}
