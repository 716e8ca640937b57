use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Opaque on-ledger identifier for mints, token accounts, and identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// An identity that can sign ledger submissions.
///
/// The actual signing primitive is out of scope; the seed stands in for
/// whatever key material the real transport would use. The seed never
/// leaves this struct and is excluded from Debug output.
#[derive(Clone)]
pub struct SigningIdentity {
    address: Address,
    seed: [u8; 32],
}

impl SigningIdentity {
    /// Generate a fresh throwaway identity.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let seed: [u8; 32] = rng.random();
        let address = Address::new(
            seed[..20]
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<String>(),
        );
        Self { address, seed }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .field("seed", &"<redacted>")
            .finish()
    }
}

impl PartialEq for SigningIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.seed == other.seed
    }
}

impl Eq for SigningIdentity {}

/// The ledger's acknowledgment that a submitted operation settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationHandle(String);

impl ConfirmationHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last-observed projection of a mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintInfo {
    pub address: Address,
    pub decimals: u8,
    pub supply: u64,
    pub mint_authority: Address,
    pub freeze_authority: Address,
}

/// An active delegate and the allowance it has left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegate: Address,
    pub allowance: u64,
}

/// Last-observed projection of a token account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccountInfo {
    pub address: Address,
    pub mint: Address,
    pub owner: Address,
    pub balance: u64,
    pub delegation: Option<Delegation>,
}
