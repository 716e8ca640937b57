// Mintflow - token lifecycle workflow orchestration
// This exposes the core components for testing and integration

pub mod config;
pub mod identity;
pub mod ledger;
pub mod observability;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use config::{config, init_config, MintflowConfig};
pub use identity::{EphemeralIdentities, IdentityProvider};
pub use ledger::{
    Address, ConfirmationHandle, Delegation, InMemoryLedger, LedgerError, LedgerOps, MintInfo,
    RejectionReason, SigningIdentity, TokenAccountInfo,
};
pub use observability::{
    announce_confirmed_step, ledger_metrics, ExplorerLinks, LedgerMetrics, OperationTimer,
};
pub use telemetry::{create_run_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use workflow::{
    base_units, format_base_units, token_lifecycle, AccountRef, ActorRef, AmountError,
    CancelHandle, LifecyclePlan, Operation, RunContext, RunState, StepError, StepId, StepOutput,
    StepRecord, StepSpec, StepStatus, WorkflowOrchestrator, WorkflowResult, DEFAULT_STEP_TIMEOUT,
};
