//! Step and run state machines.
//!
//! A step moves `Pending -> Submitted -> Confirmed | Failed`; the run as a
//! whole moves `NotStarted -> Running -> Completed | Aborted`. Confirmed
//! steps are never rolled back: on abort, the result surfaces the last
//! confirmed state so a caller can decide whether to resume from there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::StepError;
use super::step::{StepId, StepOutput, StepSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Submitted,
    Confirmed { output: StepOutput },
    Failed { error: StepError },
}

impl StepStatus {
    pub fn name(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Submitted => "submitted",
            StepStatus::Confirmed { .. } => "confirmed",
            StepStatus::Failed { .. } => "failed",
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, StepStatus::Confirmed { .. } | StepStatus::Failed { .. })
    }
}

/// One entry of the append-only step sequence a run owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub spec: StepSpec,
    pub status: StepStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    pub fn new(spec: StepSpec) -> Self {
        Self {
            spec,
            status: StepStatus::Pending,
            submitted_at: None,
            settled_at: None,
        }
    }

    pub fn submit(&mut self) {
        debug_assert!(
            matches!(self.status, StepStatus::Pending),
            "step '{}' submitted while {}",
            self.spec.id,
            self.status.name()
        );
        self.status = StepStatus::Submitted;
        self.submitted_at = Some(Utc::now());
    }

    pub fn confirm(&mut self, output: StepOutput) {
        debug_assert!(
            matches!(self.status, StepStatus::Submitted),
            "step '{}' confirmed while {}",
            self.spec.id,
            self.status.name()
        );
        self.status = StepStatus::Confirmed { output };
        self.settled_at = Some(Utc::now());
    }

    /// Fail the step. Pre-submission validation failures land here too, so
    /// a `Pending` step may fail without ever being submitted.
    pub fn fail(&mut self, error: StepError) {
        debug_assert!(
            !self.status.is_settled(),
            "step '{}' failed while {}",
            self.spec.id,
            self.status.name()
        );
        self.status = StepStatus::Failed { error };
        self.settled_at = Some(Utc::now());
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, StepStatus::Confirmed { .. })
    }

    pub fn output(&self) -> Option<&StepOutput> {
        match &self.status {
            StepStatus::Confirmed { output } => Some(output),
            _ => None,
        }
    }

    pub fn duration_ms(&self) -> Option<u64> {
        match (self.submitted_at, self.settled_at) {
            (Some(start), Some(end)) => {
                Some(end.signed_duration_since(start).num_milliseconds().max(0) as u64)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    Aborted { step: StepId, error: StepError },
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::NotStarted => "not-started",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Aborted { .. } => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Aborted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::step::Operation;

    fn record() -> StepRecord {
        StepRecord::new(StepSpec::new(
            "create-mint",
            Operation::CreateMint { decimals: 2 },
        ))
    }

    #[test]
    fn step_walks_pending_submitted_confirmed() {
        let mut step = record();
        assert_eq!(step.status.name(), "pending");
        assert!(step.output().is_none());

        step.submit();
        assert_eq!(step.status.name(), "submitted");
        assert!(!step.status.is_settled());

        step.confirm(StepOutput::Mint {
            address: crate::ledger::Address::new("aa".repeat(20)),
        });
        assert!(step.is_confirmed());
        assert!(step.status.is_settled());
        assert!(step.duration_ms().is_some());
    }

    #[test]
    fn pending_step_can_fail_without_submission() {
        let mut step = record();
        step.fail(StepError::Cancelled);
        assert!(step.status.is_settled());
        assert!(!step.is_confirmed());
        assert!(step.submitted_at.is_none());
    }

    #[test]
    fn only_completed_and_aborted_are_terminal() {
        assert!(!RunState::NotStarted.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Aborted {
            step: StepId::new("burn"),
            error: StepError::Cancelled,
        }
        .is_terminal());
    }
}
