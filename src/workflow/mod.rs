//! Workflow orchestration for the token lifecycle: the step table with
//! symbolic dependency bindings, the step and run state machines, the
//! error taxonomy, and the orchestrator that drives a `LedgerOps`
//! capability one settled step at a time.

pub mod amount;
pub mod errors;
pub mod orchestrator;
pub mod state_machine;
pub mod step;

pub use amount::{base_units, format_base_units, AmountError};
pub use errors::StepError;
pub use orchestrator::{
    CancelHandle, RunContext, WorkflowOrchestrator, WorkflowResult, DEFAULT_STEP_TIMEOUT,
};
pub use state_machine::{RunState, StepRecord, StepStatus};
pub use step::{
    token_lifecycle, AccountRef, ActorRef, LifecyclePlan, Operation, StepId, StepOutput, StepSpec,
};
