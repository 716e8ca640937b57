use async_trait::async_trait;

use super::errors::LedgerError;
use super::types::{Address, ConfirmationHandle, MintInfo, SigningIdentity, TokenAccountInfo};

/// Ledger operations the workflow orchestrator consumes.
///
/// Every call is an asynchronous request/response against a remote ledger:
/// it can settle, be rejected, or time out. Transaction construction,
/// signing, and fee handling all live behind this seam.
#[async_trait]
pub trait LedgerOps: Send + Sync {
    /// Create a new fungible token mint. The returned address identifies
    /// the asset class for every later operation.
    async fn create_mint(
        &self,
        payer: &SigningIdentity,
        mint_authority: &Address,
        freeze_authority: &Address,
        decimals: u8,
    ) -> Result<Address, LedgerError>;

    /// Fetch the token account for `(mint, owner)`, creating it if absent.
    /// Returns the account address and whether it already existed, so the
    /// call is safe to repeat on workflow resume.
    async fn get_or_create_token_account(
        &self,
        payer: &SigningIdentity,
        mint: &Address,
        owner: &Address,
    ) -> Result<(Address, bool), LedgerError>;

    /// Issue new supply into `destination`. `authority` must be the mint
    /// authority.
    async fn mint_to(
        &self,
        payer: &SigningIdentity,
        mint: &Address,
        destination: &Address,
        authority: &SigningIdentity,
        amount: u64,
    ) -> Result<ConfirmationHandle, LedgerError>;

    /// Authorize `delegate` to move up to `amount` base units out of
    /// `account`. Replaces any prior delegation on the account.
    async fn approve_delegate(
        &self,
        payer: &SigningIdentity,
        account: &Address,
        delegate: &Address,
        owner: &SigningIdentity,
        amount: u64,
    ) -> Result<ConfirmationHandle, LedgerError>;

    /// Move `amount` base units from `source` to `destination`.
    /// `authority` is either the account owner or its active delegate;
    /// delegate transfers draw down the remaining allowance.
    async fn transfer(
        &self,
        payer: &SigningIdentity,
        source: &Address,
        destination: &Address,
        authority: &SigningIdentity,
        amount: u64,
    ) -> Result<ConfirmationHandle, LedgerError>;

    /// Clear the active delegation on `account`.
    async fn revoke_delegate(
        &self,
        payer: &SigningIdentity,
        account: &Address,
        owner: &SigningIdentity,
    ) -> Result<ConfirmationHandle, LedgerError>;

    /// Destroy `amount` base units held by `account`, reducing total supply.
    async fn burn(
        &self,
        payer: &SigningIdentity,
        account: &Address,
        mint: &Address,
        authority: &SigningIdentity,
        amount: u64,
    ) -> Result<ConfirmationHandle, LedgerError>;

    async fn mint_info(&self, mint: &Address) -> Result<MintInfo, LedgerError>;

    async fn token_account_info(&self, account: &Address)
        -> Result<TokenAccountInfo, LedgerError>;
}
