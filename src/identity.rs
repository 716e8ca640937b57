//! The Identity Provider seam.
//!
//! Supplies the payer identity and fresh throwaway identities for the
//! delegate and receiver roles. Key persistence and test-network funding
//! live behind this trait and are out of scope for the orchestrator.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

use crate::ledger::SigningIdentity;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The payer for a run. Repeated calls return the same identity so a
    /// resumed run signs with the keys that own the accounts it created.
    async fn get_or_create_payer(&self) -> Result<SigningIdentity>;

    /// A fresh throwaway identity with no persistence.
    fn fresh_identity(&self) -> SigningIdentity;
}

/// In-process identity provider: generates the payer on first use and
/// caches it for the lifetime of the process.
#[derive(Debug, Default)]
pub struct EphemeralIdentities {
    payer: Mutex<Option<SigningIdentity>>,
}

impl EphemeralIdentities {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for EphemeralIdentities {
    async fn get_or_create_payer(&self) -> Result<SigningIdentity> {
        let mut slot = self
            .payer
            .lock()
            .map_err(|_| anyhow::anyhow!("payer cache lock poisoned"))?;
        if let Some(payer) = slot.as_ref() {
            return Ok(payer.clone());
        }
        let payer = SigningIdentity::generate();
        info!(address = %payer.address(), "generated payer identity");
        *slot = Some(payer.clone());
        Ok(payer)
    }

    fn fresh_identity(&self) -> SigningIdentity {
        SigningIdentity::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn payer_is_stable_across_calls() {
        let identities = EphemeralIdentities::new();
        let first = identities.get_or_create_payer().await.expect("payer");
        let second = identities.get_or_create_payer().await.expect("payer");
        assert_eq!(first.address(), second.address());
    }

    #[tokio::test]
    async fn fresh_identities_are_unique() {
        let identities = EphemeralIdentities::new();
        let a = identities.fresh_identity();
        let b = identities.fresh_identity();
        assert_ne!(a.address(), b.address());
    }
}
