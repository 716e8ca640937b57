//! In-memory ledger with SPL-style token semantics.
//!
//! Backs the demo binary and the test suite. Behaves like a remote ledger:
//! optional simulated latency, per-operation failure and delay injection,
//! and the same rejection rules a real token program enforces (authority
//! checks, balance and allowance accounting, single active delegate).

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::client::LedgerOps;
use super::errors::{LedgerError, RejectionReason};
use super::types::{
    Address, ConfirmationHandle, Delegation, MintInfo, SigningIdentity, TokenAccountInfo,
};

#[derive(Debug, Clone)]
struct MintRecord {
    decimals: u8,
    supply: u64,
    mint_authority: Address,
    freeze_authority: Address,
}

#[derive(Debug, Clone)]
struct AccountRecord {
    mint: Address,
    owner: Address,
    balance: u64,
    delegation: Option<Delegation>,
}

#[derive(Debug, Default)]
struct LedgerState {
    mints: HashMap<Address, MintRecord>,
    accounts: HashMap<Address, AccountRecord>,
    // (mint, owner) -> account address, for get-or-create idempotency
    by_owner: HashMap<(Address, Address), Address>,
}

#[derive(Debug, Default)]
struct FaultPlan {
    // queued one-shot failures per operation name
    failures: HashMap<String, VecDeque<LedgerError>>,
    // extra latency per operation name, applied to every call
    delays: HashMap<String, Duration>,
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    faults: Mutex<FaultPlan>,
    latency: Duration,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a base latency to every operation, so the ledger behaves like
    /// the remote endpoint it stands in for.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue a one-shot failure for the next call to `operation`
    /// (operation names match the `LedgerOps` method names).
    pub async fn inject_failure(&self, operation: &str, error: LedgerError) {
        self.faults
            .lock()
            .await
            .failures
            .entry(operation.to_string())
            .or_default()
            .push_back(error);
    }

    /// Delay every call to `operation` by `delay` on top of the base
    /// latency. Used to drive step timeouts in tests.
    pub async fn inject_delay(&self, operation: &str, delay: Duration) {
        self.faults
            .lock()
            .await
            .delays
            .insert(operation.to_string(), delay);
    }

    pub async fn clear_injected_delay(&self, operation: &str) {
        self.faults.lock().await.delays.remove(operation);
    }

    /// Latency and fault gate shared by every operation.
    async fn gate(&self, operation: &str) -> Result<(), LedgerError> {
        let extra = self
            .faults
            .lock()
            .await
            .delays
            .get(operation)
            .copied()
            .unwrap_or_default();
        let wait = self.latency + extra;
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        let injected = self
            .faults
            .lock()
            .await
            .failures
            .get_mut(operation)
            .and_then(|queue| queue.pop_front());
        match injected {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn fresh_address() -> Address {
        let mut rng = rand::rng();
        let bytes: [u8; 20] = rng.random();
        Address::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
    }

    fn confirmation() -> ConfirmationHandle {
        ConfirmationHandle::new(Uuid::new_v4().simple().to_string())
    }
}

/// Debit `amount` from `account` on behalf of `authority`, enforcing
/// owner/delegate rules. Delegate debits draw down the allowance and clear
/// the delegation once it reaches zero.
fn debit(
    account: &mut AccountRecord,
    account_address: &Address,
    authority: &Address,
    amount: u64,
    action: &str,
) -> Result<(), RejectionReason> {
    if *authority != account.owner {
        let delegation = account
            .delegation
            .as_mut()
            .ok_or_else(|| RejectionReason::NoActiveDelegate {
                account: account_address.clone(),
            })?;
        if delegation.delegate != *authority {
            return Err(RejectionReason::BadAuthority {
                authority: authority.clone(),
                action: action.to_string(),
            });
        }
        if delegation.allowance < amount {
            return Err(RejectionReason::InsufficientAllowance {
                remaining: delegation.allowance,
                required: amount,
            });
        }
        delegation.allowance -= amount;
        if delegation.allowance == 0 {
            account.delegation = None;
        }
    }
    if account.balance < amount {
        return Err(RejectionReason::InsufficientFunds {
            balance: account.balance,
            required: amount,
        });
    }
    account.balance -= amount;
    Ok(())
}

#[async_trait]
impl LedgerOps for InMemoryLedger {
    async fn create_mint(
        &self,
        _payer: &SigningIdentity,
        mint_authority: &Address,
        freeze_authority: &Address,
        decimals: u8,
    ) -> Result<Address, LedgerError> {
        self.gate("create_mint").await?;
        let address = Self::fresh_address();
        self.state.lock().await.mints.insert(
            address.clone(),
            MintRecord {
                decimals,
                supply: 0,
                mint_authority: mint_authority.clone(),
                freeze_authority: freeze_authority.clone(),
            },
        );
        Ok(address)
    }

    async fn get_or_create_token_account(
        &self,
        _payer: &SigningIdentity,
        mint: &Address,
        owner: &Address,
    ) -> Result<(Address, bool), LedgerError> {
        self.gate("get_or_create_token_account").await?;
        let mut state = self.state.lock().await;
        if !state.mints.contains_key(mint) {
            return Err(RejectionReason::UnknownMint(mint.clone()).into());
        }
        let key = (mint.clone(), owner.clone());
        if let Some(existing) = state.by_owner.get(&key) {
            return Ok((existing.clone(), true));
        }
        let address = Self::fresh_address();
        state.accounts.insert(
            address.clone(),
            AccountRecord {
                mint: mint.clone(),
                owner: owner.clone(),
                balance: 0,
                delegation: None,
            },
        );
        state.by_owner.insert(key, address.clone());
        Ok((address, false))
    }

    async fn mint_to(
        &self,
        _payer: &SigningIdentity,
        mint: &Address,
        destination: &Address,
        authority: &SigningIdentity,
        amount: u64,
    ) -> Result<ConfirmationHandle, LedgerError> {
        self.gate("mint_to").await?;
        let mut state = self.state.lock().await;
        let mint_record = state
            .mints
            .get(mint)
            .ok_or_else(|| RejectionReason::UnknownMint(mint.clone()))?;
        if mint_record.mint_authority != *authority.address() {
            return Err(RejectionReason::BadAuthority {
                authority: authority.address().clone(),
                action: "mint supply".to_string(),
            }
            .into());
        }
        let new_supply = mint_record
            .supply
            .checked_add(amount)
            .ok_or(RejectionReason::SupplyOverflow)?;
        let account = state
            .accounts
            .get_mut(destination)
            .ok_or_else(|| RejectionReason::UnknownAccount(destination.clone()))?;
        if account.mint != *mint {
            return Err(RejectionReason::MintMismatch {
                account: destination.clone(),
                mint: mint.clone(),
            }
            .into());
        }
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(RejectionReason::SupplyOverflow)?;
        if let Some(record) = state.mints.get_mut(mint) {
            record.supply = new_supply;
        }
        Ok(Self::confirmation())
    }

    async fn approve_delegate(
        &self,
        _payer: &SigningIdentity,
        account: &Address,
        delegate: &Address,
        owner: &SigningIdentity,
        amount: u64,
    ) -> Result<ConfirmationHandle, LedgerError> {
        self.gate("approve_delegate").await?;
        let mut state = self.state.lock().await;
        let record = state
            .accounts
            .get_mut(account)
            .ok_or_else(|| RejectionReason::UnknownAccount(account.clone()))?;
        if record.owner != *owner.address() {
            return Err(RejectionReason::BadAuthority {
                authority: owner.address().clone(),
                action: "approve a delegate".to_string(),
            }
            .into());
        }
        // A new approval replaces any prior delegation.
        record.delegation = Some(Delegation {
            delegate: delegate.clone(),
            allowance: amount,
        });
        Ok(Self::confirmation())
    }

    async fn transfer(
        &self,
        _payer: &SigningIdentity,
        source: &Address,
        destination: &Address,
        authority: &SigningIdentity,
        amount: u64,
    ) -> Result<ConfirmationHandle, LedgerError> {
        self.gate("transfer").await?;
        let mut state = self.state.lock().await;
        let source_mint = {
            let record = state
                .accounts
                .get(source)
                .ok_or_else(|| RejectionReason::UnknownAccount(source.clone()))?;
            record.mint.clone()
        };
        {
            let destination_record = state
                .accounts
                .get(destination)
                .ok_or_else(|| RejectionReason::UnknownAccount(destination.clone()))?;
            if destination_record.mint != source_mint {
                return Err(RejectionReason::MintMismatch {
                    account: destination.clone(),
                    mint: source_mint,
                }
                .into());
            }
        }
        let source_record = state
            .accounts
            .get_mut(source)
            .ok_or_else(|| RejectionReason::UnknownAccount(source.clone()))?;
        debit(
            source_record,
            source,
            authority.address(),
            amount,
            "transfer from this account",
        )?;
        let destination_record = state
            .accounts
            .get_mut(destination)
            .ok_or_else(|| RejectionReason::UnknownAccount(destination.clone()))?;
        destination_record.balance = destination_record
            .balance
            .checked_add(amount)
            .ok_or(RejectionReason::SupplyOverflow)?;
        Ok(Self::confirmation())
    }

    async fn revoke_delegate(
        &self,
        _payer: &SigningIdentity,
        account: &Address,
        owner: &SigningIdentity,
    ) -> Result<ConfirmationHandle, LedgerError> {
        self.gate("revoke_delegate").await?;
        let mut state = self.state.lock().await;
        let record = state
            .accounts
            .get_mut(account)
            .ok_or_else(|| RejectionReason::UnknownAccount(account.clone()))?;
        if record.owner != *owner.address() {
            return Err(RejectionReason::BadAuthority {
                authority: owner.address().clone(),
                action: "revoke the delegate".to_string(),
            }
            .into());
        }
        record.delegation = None;
        Ok(Self::confirmation())
    }

    async fn burn(
        &self,
        _payer: &SigningIdentity,
        account: &Address,
        mint: &Address,
        authority: &SigningIdentity,
        amount: u64,
    ) -> Result<ConfirmationHandle, LedgerError> {
        self.gate("burn").await?;
        let mut state = self.state.lock().await;
        if !state.mints.contains_key(mint) {
            return Err(RejectionReason::UnknownMint(mint.clone()).into());
        }
        let record = state
            .accounts
            .get_mut(account)
            .ok_or_else(|| RejectionReason::UnknownAccount(account.clone()))?;
        if record.mint != *mint {
            return Err(RejectionReason::MintMismatch {
                account: account.clone(),
                mint: mint.clone(),
            }
            .into());
        }
        debit(
            record,
            account,
            authority.address(),
            amount,
            "burn from this account",
        )?;
        let mint_record = state
            .mints
            .get_mut(mint)
            .ok_or_else(|| RejectionReason::UnknownMint(mint.clone()))?;
        mint_record.supply = mint_record
            .supply
            .checked_sub(amount)
            .ok_or(RejectionReason::SupplyOverflow)?;
        Ok(Self::confirmation())
    }

    async fn mint_info(&self, mint: &Address) -> Result<MintInfo, LedgerError> {
        self.gate("mint_info").await?;
        let state = self.state.lock().await;
        let record = state
            .mints
            .get(mint)
            .ok_or_else(|| RejectionReason::UnknownMint(mint.clone()))?;
        Ok(MintInfo {
            address: mint.clone(),
            decimals: record.decimals,
            supply: record.supply,
            mint_authority: record.mint_authority.clone(),
            freeze_authority: record.freeze_authority.clone(),
        })
    }

    async fn token_account_info(
        &self,
        account: &Address,
    ) -> Result<TokenAccountInfo, LedgerError> {
        self.gate("token_account_info").await?;
        let state = self.state.lock().await;
        let record = state
            .accounts
            .get(account)
            .ok_or_else(|| RejectionReason::UnknownAccount(account.clone()))?;
        Ok(TokenAccountInfo {
            address: account.clone(),
            mint: record.mint.clone(),
            owner: record.owner.clone(),
            balance: record.balance,
            delegation: record.delegation.clone(),
        })
    }
}
