//! The workflow step table.
//!
//! A run is an ordered list of step specs whose inputs may symbolically
//! reference the outputs of earlier steps by id, so the sequence is
//! data-driven rather than positionally hardcoded: steps can be inserted
//! or reordered without renumbering dependents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::{Address, ConfirmationHandle};

use super::amount::{base_units, AmountError};

/// Canonical step ids for the token lifecycle.
pub const CREATE_MINT: &str = "create-mint";
pub const OWNER_ACCOUNT: &str = "owner-account";
pub const MINT_SUPPLY: &str = "mint-supply";
pub const APPROVE_DELEGATE: &str = "approve-delegate";
pub const RECEIVER_ACCOUNT: &str = "receiver-account";
pub const TRANSFER: &str = "transfer";
pub const REVOKE_DELEGATE: &str = "revoke-delegate";
pub const BURN: &str = "burn";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// A mint or account parameter: either the output of an earlier step or a
/// literal address known up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountRef {
    Output(StepId),
    Fixed(Address),
}

impl AccountRef {
    pub fn output(id: &str) -> Self {
        AccountRef::Output(StepId::new(id))
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Output(id) => write!(f, "@{id}"),
            AccountRef::Fixed(address) => write!(f, "{address}"),
        }
    }
}

/// A signing identity parameter, resolved from the run context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorRef {
    Payer,
    Delegate,
    Receiver,
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActorRef::Payer => "payer",
            ActorRef::Delegate => "delegate",
            ActorRef::Receiver => "receiver",
        };
        f.write_str(name)
    }
}

/// One token-lifecycle operation with symbolic inputs.
/// Amounts are integer base units, validated before the table is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    CreateMint {
        decimals: u8,
    },
    GetOrCreateAccount {
        mint: AccountRef,
        owner: ActorRef,
    },
    MintTo {
        mint: AccountRef,
        destination: AccountRef,
        authority: ActorRef,
        amount: u64,
    },
    ApproveDelegate {
        account: AccountRef,
        delegate: ActorRef,
        owner: ActorRef,
        amount: u64,
    },
    Transfer {
        source: AccountRef,
        destination: AccountRef,
        authority: ActorRef,
        amount: u64,
    },
    RevokeDelegate {
        account: AccountRef,
        owner: ActorRef,
    },
    Burn {
        account: AccountRef,
        mint: AccountRef,
        authority: ActorRef,
        amount: u64,
    },
}

impl Operation {
    /// Operation kind, matching the `LedgerOps` method it dispatches to.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::CreateMint { .. } => "create_mint",
            Operation::GetOrCreateAccount { .. } => "get_or_create_token_account",
            Operation::MintTo { .. } => "mint_to",
            Operation::ApproveDelegate { .. } => "approve_delegate",
            Operation::Transfer { .. } => "transfer",
            Operation::RevokeDelegate { .. } => "revoke_delegate",
            Operation::Burn { .. } => "burn",
        }
    }

    /// Human-readable one-line description for CLI output.
    pub fn describe(&self) -> String {
        match self {
            Operation::CreateMint { decimals } => {
                format!("create_mint(decimals={decimals})")
            }
            Operation::GetOrCreateAccount { mint, owner } => {
                format!("get_or_create_token_account(mint={mint}, owner={owner})")
            }
            Operation::MintTo {
                mint,
                destination,
                authority,
                amount,
            } => format!(
                "mint_to(mint={mint}, destination={destination}, authority={authority}, amount={amount})"
            ),
            Operation::ApproveDelegate {
                account,
                delegate,
                owner,
                amount,
            } => format!(
                "approve_delegate(account={account}, delegate={delegate}, owner={owner}, amount={amount})"
            ),
            Operation::Transfer {
                source,
                destination,
                authority,
                amount,
            } => format!(
                "transfer(source={source}, destination={destination}, authority={authority}, amount={amount})"
            ),
            Operation::RevokeDelegate { account, owner } => {
                format!("revoke_delegate(account={account}, owner={owner})")
            }
            Operation::Burn {
                account,
                mint,
                authority,
                amount,
            } => format!(
                "burn(account={account}, mint={mint}, authority={authority}, amount={amount})"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    pub id: StepId,
    pub op: Operation,
}

impl StepSpec {
    pub fn new(id: &str, op: Operation) -> Self {
        Self {
            id: StepId::new(id),
            op,
        }
    }
}

/// What a confirmed step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutput {
    Mint { address: Address },
    Account { address: Address, existed: bool },
    Confirmation { handle: ConfirmationHandle },
}

impl StepOutput {
    /// Address produced by this step, if it produced one.
    pub fn address(&self) -> Option<&Address> {
        match self {
            StepOutput::Mint { address } => Some(address),
            StepOutput::Account { address, .. } => Some(address),
            StepOutput::Confirmation { .. } => None,
        }
    }
}

/// The amounts for one canonical lifecycle run, in base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePlan {
    pub decimals: u8,
    pub mint_amount: u64,
    pub approve_amount: u64,
    pub transfer_amount: u64,
    pub burn_amount: u64,
}

impl LifecyclePlan {
    /// Build a plan from human-readable decimal amounts. Fails with
    /// `AmountError` before anything is submitted.
    pub fn from_human(
        decimals: u8,
        mint: &str,
        approve: &str,
        transfer: &str,
        burn: &str,
    ) -> Result<Self, AmountError> {
        Ok(Self {
            decimals,
            mint_amount: base_units(mint, decimals)?,
            approve_amount: base_units(approve, decimals)?,
            transfer_amount: base_units(transfer, decimals)?,
            burn_amount: base_units(burn, decimals)?,
        })
    }
}

/// The canonical eight-step token lifecycle: create a mint, create the
/// owner's account, mint supply, approve a delegate, create the receiver's
/// account, transfer as the delegate, revoke, burn.
pub fn token_lifecycle(plan: &LifecyclePlan) -> Vec<StepSpec> {
    vec![
        StepSpec::new(
            CREATE_MINT,
            Operation::CreateMint {
                decimals: plan.decimals,
            },
        ),
        StepSpec::new(
            OWNER_ACCOUNT,
            Operation::GetOrCreateAccount {
                mint: AccountRef::output(CREATE_MINT),
                owner: ActorRef::Payer,
            },
        ),
        StepSpec::new(
            MINT_SUPPLY,
            Operation::MintTo {
                mint: AccountRef::output(CREATE_MINT),
                destination: AccountRef::output(OWNER_ACCOUNT),
                authority: ActorRef::Payer,
                amount: plan.mint_amount,
            },
        ),
        StepSpec::new(
            APPROVE_DELEGATE,
            Operation::ApproveDelegate {
                account: AccountRef::output(OWNER_ACCOUNT),
                delegate: ActorRef::Delegate,
                owner: ActorRef::Payer,
                amount: plan.approve_amount,
            },
        ),
        StepSpec::new(
            RECEIVER_ACCOUNT,
            Operation::GetOrCreateAccount {
                mint: AccountRef::output(CREATE_MINT),
                owner: ActorRef::Receiver,
            },
        ),
        StepSpec::new(
            TRANSFER,
            Operation::Transfer {
                source: AccountRef::output(OWNER_ACCOUNT),
                destination: AccountRef::output(RECEIVER_ACCOUNT),
                authority: ActorRef::Delegate,
                amount: plan.transfer_amount,
            },
        ),
        StepSpec::new(
            REVOKE_DELEGATE,
            Operation::RevokeDelegate {
                account: AccountRef::output(OWNER_ACCOUNT),
                owner: ActorRef::Payer,
            },
        ),
        StepSpec::new(
            BURN,
            Operation::Burn {
                account: AccountRef::output(OWNER_ACCOUNT),
                mint: AccountRef::output(CREATE_MINT),
                authority: ActorRef::Payer,
                amount: plan.burn_amount,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_plan() -> LifecyclePlan {
        LifecyclePlan::from_human(2, "100", "50", "50", "25").expect("valid plan")
    }

    #[test]
    fn plan_amounts_are_base_units() {
        let plan = demo_plan();
        assert_eq!(plan.mint_amount, 10_000);
        assert_eq!(plan.approve_amount, 5_000);
        assert_eq!(plan.transfer_amount, 5_000);
        assert_eq!(plan.burn_amount, 2_500);
    }

    #[test]
    fn canonical_table_has_eight_ordered_steps() {
        let steps = token_lifecycle(&demo_plan());
        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                CREATE_MINT,
                OWNER_ACCOUNT,
                MINT_SUPPLY,
                APPROVE_DELEGATE,
                RECEIVER_ACCOUNT,
                TRANSFER,
                REVOKE_DELEGATE,
                BURN,
            ]
        );
    }

    #[test]
    fn transfer_is_authorized_by_the_delegate() {
        let steps = token_lifecycle(&demo_plan());
        let transfer = steps
            .iter()
            .find(|s| s.id.as_str() == TRANSFER)
            .expect("transfer step");
        match &transfer.op {
            Operation::Transfer {
                source, authority, ..
            } => {
                assert_eq!(*source, AccountRef::output(OWNER_ACCOUNT));
                assert_eq!(*authority, ActorRef::Delegate);
            }
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[test]
    fn fractional_plan_amounts_are_rejected() {
        let err = LifecyclePlan::from_human(2, "100", "50.005", "50", "25");
        assert!(matches!(err, Err(AmountError::TooPrecise { .. })));
    }
}
