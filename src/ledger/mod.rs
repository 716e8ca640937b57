//! The Ledger Client capability: the trait seam the orchestrator drives,
//! its error taxonomy, shared data types, and the in-memory reference
//! ledger used by the demo binary and the test suite.

pub mod client;
pub mod errors;
pub mod memory;
pub mod types;

pub use client::LedgerOps;
pub use errors::{LedgerError, RejectionReason};
pub use memory::InMemoryLedger;
pub use types::{
    Address, ConfirmationHandle, Delegation, MintInfo, SigningIdentity, TokenAccountInfo,
};
