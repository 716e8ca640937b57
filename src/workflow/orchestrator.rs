//! The workflow orchestrator.
//!
//! Executes a dependency-ordered sequence of token operations exactly once
//! each, threading outputs of earlier steps into the inputs of later ones.
//! Steps are strictly sequential: each must settle (Confirmed or Failed)
//! before the next is issued, because later parameters are not known until
//! earlier results return. On the first failure the run aborts; confirmed
//! steps are kept in the result for inspection or resume.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::identity::IdentityProvider;
use crate::ledger::{Address, LedgerError, LedgerOps, SigningIdentity};
use crate::observability::{announce_confirmed_step, ledger_metrics, ExplorerLinks, OperationTimer};
use crate::telemetry::create_run_span;

use super::errors::StepError;
use super::state_machine::{RunState, StepRecord};
use super::step::{
    token_lifecycle, AccountRef, ActorRef, LifecyclePlan, Operation, StepId, StepOutput, StepSpec,
    CREATE_MINT, OWNER_ACCOUNT, RECEIVER_ACCOUNT,
};

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Identities for one run. The payer signs and funds every submission;
/// delegate and receiver are fresh throwaway identities, supplied by the
/// caller rather than generated here.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub payer: SigningIdentity,
    pub delegate: SigningIdentity,
    pub receiver: SigningIdentity,
}

impl RunContext {
    /// Provision a context from an identity provider: persistent payer,
    /// fresh delegate and receiver.
    pub async fn provision(provider: &dyn IdentityProvider) -> anyhow::Result<Self> {
        Ok(Self {
            payer: provider.get_or_create_payer().await?,
            delegate: provider.fresh_identity(),
            receiver: provider.fresh_identity(),
        })
    }

    fn actor(&self, actor: ActorRef) -> &SigningIdentity {
        match actor {
            ActorRef::Payer => &self.payer,
            ActorRef::Delegate => &self.delegate,
            ActorRef::Receiver => &self.receiver,
        }
    }
}

/// Cancels runs driven by the orchestrator that issued it. Cancellation
/// takes effect at the next step boundary, never mid-submission: a
/// submitted step is always awaited to its outcome first.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal report of one workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub run_id: String,
    pub state: RunState,
    pub steps: Vec<StepRecord>,
    pub mint: Option<Address>,
    pub owner_account: Option<Address>,
    pub receiver_account: Option<Address>,
}

impl WorkflowResult {
    pub fn is_completed(&self) -> bool {
        matches!(self.state, RunState::Completed)
    }

    pub fn failure(&self) -> Option<(&StepId, &StepError)> {
        match &self.state {
            RunState::Aborted { step, error } => Some((step, error)),
            _ => None,
        }
    }

    pub fn confirmed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.is_confirmed()).count()
    }
}

pub struct WorkflowOrchestrator {
    ledger: Arc<dyn LedgerOps>,
    step_timeout: Duration,
    links: ExplorerLinks,
    cancel: CancelHandle,
}

impl WorkflowOrchestrator {
    pub fn new(ledger: Arc<dyn LedgerOps>) -> Self {
        Self {
            ledger,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            links: ExplorerLinks::default(),
            cancel: CancelHandle::default(),
        }
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_network(mut self, explorer_base: &str, cluster: &str) -> Self {
        self.links = ExplorerLinks::new(explorer_base, cluster);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Execute the canonical token lifecycle.
    pub async fn run(&self, ctx: &RunContext, plan: &LifecyclePlan) -> WorkflowResult {
        self.run_steps(ctx, token_lifecycle(plan)).await
    }

    /// Execute an arbitrary step table.
    pub async fn run_steps(&self, ctx: &RunContext, steps: Vec<StepSpec>) -> WorkflowResult {
        self.run_seeded(ctx, steps, &[]).await
    }

    /// Re-run the canonical lifecycle, skipping steps a prior run already
    /// confirmed. Prior outputs are re-bound into the dependency table, so
    /// the run continues at the first unconfirmed step. Account-create
    /// steps are get-or-create and therefore safe to repeat even when the
    /// prior run's outcome for them is unknown.
    pub async fn resume(
        &self,
        ctx: &RunContext,
        plan: &LifecyclePlan,
        prior: &WorkflowResult,
    ) -> WorkflowResult {
        self.run_seeded(ctx, token_lifecycle(plan), &prior.steps)
            .await
    }

    async fn run_seeded(
        &self,
        ctx: &RunContext,
        steps: Vec<StepSpec>,
        seed: &[StepRecord],
    ) -> WorkflowResult {
        let run_id = Uuid::new_v4().to_string();
        let span = create_run_span("token_lifecycle", &run_id);
        self.run_inner(ctx, steps, seed, run_id.clone())
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        ctx: &RunContext,
        steps: Vec<StepSpec>,
        seed: &[StepRecord],
        run_id: String,
    ) -> WorkflowResult {
        let mut records: Vec<StepRecord> = steps.into_iter().map(StepRecord::new).collect();
        let mut bindings: HashMap<StepId, Address> = HashMap::new();
        let mut failure: Option<(StepId, StepError)> = None;

        info!(run_id = %run_id, steps = records.len(), "workflow run started");

        for record in records.iter_mut() {
            let step_id = record.spec.id.clone();

            // Carry over results a prior run already confirmed.
            if let Some(prior) = seed
                .iter()
                .find(|p| p.spec == record.spec && p.is_confirmed())
            {
                if let Some(address) = prior.output().and_then(StepOutput::address) {
                    bindings.insert(step_id.clone(), address.clone());
                }
                *record = prior.clone();
                info!(run_id = %run_id, step = %step_id, "step already confirmed, skipping");
                continue;
            }

            // Cancellation only takes effect here, between steps.
            if self.cancel.is_cancelled() {
                info!(run_id = %run_id, step = %step_id, "run cancelled at step boundary");
                record.fail(StepError::Cancelled);
                failure = Some((step_id, StepError::Cancelled));
                break;
            }

            // Resolve symbolic inputs before anything is submitted.
            let resolved = match resolve(ctx, &record.spec, &bindings) {
                Ok(resolved) => resolved,
                Err(err) => {
                    error!(run_id = %run_id, step = %step_id, error = %err, "step inputs unresolved");
                    record.fail(err.clone());
                    failure = Some((step_id, err));
                    break;
                }
            };

            let kind = record.spec.op.kind();
            record.submit();
            ledger_metrics().record_submission();
            let timer = OperationTimer::new(kind);

            let outcome = tokio::time::timeout(self.step_timeout, self.dispatch(ctx, resolved))
                .await
                .unwrap_or_else(|_| {
                    Err(LedgerError::Timeout {
                        operation: kind.to_string(),
                        duration_ms: self.step_timeout.as_millis() as u64,
                    })
                });
            timer.finish();

            match outcome {
                Ok(output) => {
                    ledger_metrics().record_confirmation();
                    if let Some(address) = output.address() {
                        bindings.insert(step_id.clone(), address.clone());
                    }
                    announce_confirmed_step(&self.links, &step_id, &output);
                    record.confirm(output);
                }
                Err(ledger_err) => {
                    let err = StepError::from(ledger_err);
                    match err {
                        StepError::Timeout { .. } => ledger_metrics().record_timeout(),
                        _ => ledger_metrics().record_rejection(),
                    }
                    error!(run_id = %run_id, step = %step_id, error = %err, "step failed, aborting run");
                    record.fail(err.clone());
                    failure = Some((step_id, err));
                    break;
                }
            }
        }

        let state = match failure {
            Some((step, error)) => RunState::Aborted { step, error },
            None => RunState::Completed,
        };
        info!(run_id = %run_id, state = state.name(), "workflow run finished");

        let lookup = |id: &str| bindings.get(&StepId::new(id)).cloned();
        WorkflowResult {
            run_id,
            mint: lookup(CREATE_MINT),
            owner_account: lookup(OWNER_ACCOUNT),
            receiver_account: lookup(RECEIVER_ACCOUNT),
            state,
            steps: records,
        }
    }

    async fn dispatch(&self, ctx: &RunContext, op: ResolvedOp) -> Result<StepOutput, LedgerError> {
        let payer = &ctx.payer;
        match op {
            ResolvedOp::CreateMint { decimals } => {
                // Payer holds both authorities, as in the demo lifecycle.
                let address = self
                    .ledger
                    .create_mint(payer, payer.address(), payer.address(), decimals)
                    .await?;
                Ok(StepOutput::Mint { address })
            }
            ResolvedOp::GetOrCreateAccount { mint, owner } => {
                let (address, existed) = self
                    .ledger
                    .get_or_create_token_account(payer, &mint, &owner)
                    .await?;
                Ok(StepOutput::Account { address, existed })
            }
            ResolvedOp::MintTo {
                mint,
                destination,
                authority,
                amount,
            } => {
                let handle = self
                    .ledger
                    .mint_to(payer, &mint, &destination, ctx.actor(authority), amount)
                    .await?;
                Ok(StepOutput::Confirmation { handle })
            }
            ResolvedOp::ApproveDelegate {
                account,
                delegate,
                owner,
                amount,
            } => {
                let handle = self
                    .ledger
                    .approve_delegate(payer, &account, &delegate, ctx.actor(owner), amount)
                    .await?;
                Ok(StepOutput::Confirmation { handle })
            }
            ResolvedOp::Transfer {
                source,
                destination,
                authority,
                amount,
            } => {
                let handle = self
                    .ledger
                    .transfer(payer, &source, &destination, ctx.actor(authority), amount)
                    .await?;
                Ok(StepOutput::Confirmation { handle })
            }
            ResolvedOp::RevokeDelegate { account, owner } => {
                let handle = self
                    .ledger
                    .revoke_delegate(payer, &account, ctx.actor(owner))
                    .await?;
                Ok(StepOutput::Confirmation { handle })
            }
            ResolvedOp::Burn {
                account,
                mint,
                authority,
                amount,
            } => {
                let handle = self
                    .ledger
                    .burn(payer, &account, &mint, ctx.actor(authority), amount)
                    .await?;
                Ok(StepOutput::Confirmation { handle })
            }
        }
    }
}

/// An operation with every symbolic input bound to a concrete address.
#[derive(Debug, Clone)]
enum ResolvedOp {
    CreateMint {
        decimals: u8,
    },
    GetOrCreateAccount {
        mint: Address,
        owner: Address,
    },
    MintTo {
        mint: Address,
        destination: Address,
        authority: ActorRef,
        amount: u64,
    },
    ApproveDelegate {
        account: Address,
        delegate: Address,
        owner: ActorRef,
        amount: u64,
    },
    Transfer {
        source: Address,
        destination: Address,
        authority: ActorRef,
        amount: u64,
    },
    RevokeDelegate {
        account: Address,
        owner: ActorRef,
    },
    Burn {
        account: Address,
        mint: Address,
        authority: ActorRef,
        amount: u64,
    },
}

fn resolve(
    ctx: &RunContext,
    spec: &StepSpec,
    bindings: &HashMap<StepId, Address>,
) -> Result<ResolvedOp, StepError> {
    let bind = |account: &AccountRef| -> Result<Address, StepError> {
        match account {
            AccountRef::Fixed(address) => Ok(address.clone()),
            AccountRef::Output(dep) => {
                bindings
                    .get(dep)
                    .cloned()
                    .ok_or_else(|| StepError::DependencyUnresolved {
                        step: spec.id.clone(),
                        missing: dep.clone(),
                    })
            }
        }
    };

    Ok(match &spec.op {
        Operation::CreateMint { decimals } => ResolvedOp::CreateMint {
            decimals: *decimals,
        },
        Operation::GetOrCreateAccount { mint, owner } => ResolvedOp::GetOrCreateAccount {
            mint: bind(mint)?,
            owner: ctx.actor(*owner).address().clone(),
        },
        Operation::MintTo {
            mint,
            destination,
            authority,
            amount,
        } => ResolvedOp::MintTo {
            mint: bind(mint)?,
            destination: bind(destination)?,
            authority: *authority,
            amount: *amount,
        },
        Operation::ApproveDelegate {
            account,
            delegate,
            owner,
            amount,
        } => ResolvedOp::ApproveDelegate {
            account: bind(account)?,
            delegate: ctx.actor(*delegate).address().clone(),
            owner: *owner,
            amount: *amount,
        },
        Operation::Transfer {
            source,
            destination,
            authority,
            amount,
        } => ResolvedOp::Transfer {
            source: bind(source)?,
            destination: bind(destination)?,
            authority: *authority,
            amount: *amount,
        },
        Operation::RevokeDelegate { account, owner } => ResolvedOp::RevokeDelegate {
            account: bind(account)?,
            owner: *owner,
        },
        Operation::Burn {
            account,
            mint,
            authority,
            amount,
        } => ResolvedOp::Burn {
            account: bind(account)?,
            mint: bind(mint)?,
            authority: *authority,
            amount: *amount,
        },
    })
}
