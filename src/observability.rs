//! Observational side-channel: ledger call metrics and the per-step
//! explorer links emitted when a step confirms. Decoupled from the data
//! model; the orchestrator's correctness does not depend on any of this
//! output.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::info;

use crate::ledger::{Address, ConfirmationHandle};
use crate::workflow::step::{StepId, StepOutput};

/// Ledger submission counters for one process.
#[derive(Debug, Default)]
pub struct LedgerMetrics {
    pub submissions: AtomicU64,
    pub confirmations: AtomicU64,
    pub rejections: AtomicU64,
    pub timeouts: AtomicU64,
}

impl LedgerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submission(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_confirmation(&self) {
        self.confirmations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> LedgerStats {
        LedgerStats {
            submissions: self.submissions.load(Ordering::Relaxed),
            confirmations: self.confirmations.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "ledger metrics: submissions={}, confirmations={}, rejections={}, timeouts={}",
            stats.submissions, stats.confirmations, stats.rejections, stats.timeouts
        );
    }
}

#[derive(Debug, Clone)]
pub struct LedgerStats {
    pub submissions: u64,
    pub confirmations: u64,
    pub rejections: u64,
    pub timeouts: u64,
}

/// Global metrics instance
static LEDGER_METRICS: std::sync::LazyLock<LedgerMetrics> =
    std::sync::LazyLock::new(LedgerMetrics::new);

pub fn ledger_metrics() -> &'static LedgerMetrics {
    &LEDGER_METRICS
}

/// Builds explorer links for confirmed addresses and transactions,
/// mirroring the cluster explorer URL scheme.
#[derive(Debug, Clone)]
pub struct ExplorerLinks {
    base: String,
    cluster: String,
}

impl Default for ExplorerLinks {
    fn default() -> Self {
        Self::new("https://explorer.solana.com", "devnet")
    }
}

impl ExplorerLinks {
    pub fn new(base: &str, cluster: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            cluster: cluster.to_string(),
        }
    }

    pub fn address_url(&self, address: &Address) -> String {
        format!("{}/address/{}?cluster={}", self.base, address, self.cluster)
    }

    pub fn tx_url(&self, handle: &ConfirmationHandle) -> String {
        format!("{}/tx/{}?cluster={}", self.base, handle, self.cluster)
    }
}

/// Emit the human-readable record for a confirmed step: operation kind,
/// resulting address or confirmation handle, and an explorer link.
pub fn announce_confirmed_step(links: &ExplorerLinks, step: &StepId, output: &StepOutput) {
    match output {
        StepOutput::Mint { address } => info!(
            step = %step,
            address = %address,
            link = %links.address_url(address),
            "mint created"
        ),
        StepOutput::Account { address, existed } => info!(
            step = %step,
            address = %address,
            existed = existed,
            link = %links.address_url(address),
            "token account ready"
        ),
        StepOutput::Confirmation { handle } => info!(
            step = %step,
            signature = %handle,
            link = %links.tx_url(handle),
            "operation confirmed"
        ),
    }
}

/// Time an operation and log its duration on completion.
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "operation settled"
        );
    }
}
