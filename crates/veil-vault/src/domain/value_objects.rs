//! # Value Objects
//!
//! Identifiers, handles and protocol payloads exchanged with the ledger and
//! the cipher engine.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

use super::invariants::{category_index, CATEGORY_COUNT};

/// Opaque record identifier, assigned client-side at creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Authenticated identity performing an action (a connected account).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    /// Wrap an account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of the bound ledger instance. Encryption and reveal target.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractAddress(String);

impl ContractAddress {
    /// Wrap an address.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Borrow the raw address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle referencing an encrypted field stored on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CipherHandle(pub [u8; 32]);

impl CipherHandle {
    /// Derive the handle the ledger assigns to a submitted ciphertext.
    pub fn for_ciphertext(ciphertext: &[u8]) -> Self {
        let digest = Sha256::digest(ciphertext);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Hex form with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for CipherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Fixed category set. The ledger stores the index as a public field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Health
    Health,
    /// Work
    Work,
    /// Personal
    Personal,
    /// Fitness
    Fitness,
    /// Learning
    Learning,
}

impl Category {
    /// All categories in index order.
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::Health,
        Category::Work,
        Category::Personal,
        Category::Fitness,
        Category::Learning,
    ];

    /// Index submitted to the ledger.
    pub fn index(self) -> u8 {
        match self {
            Category::Health => 0,
            Category::Work => 1,
            Category::Personal => 2,
            Category::Fitness => 3,
            Category::Learning => 4,
        }
    }

    /// Category for a raw public field value (modulo mapping with fallback).
    pub fn from_code(code: Option<i64>) -> Self {
        Self::ALL[category_index(code)]
    }

    /// Lowercase display name.
    pub fn name(self) -> &'static str {
        match self {
            Category::Health => "health",
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Fitness => "fitness",
            Category::Learning => "learning",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ciphertext plus correctness proof for exactly one (target, principal, value).
///
/// Single-use: consumed by the creation request that submits it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedPayload {
    /// Opaque cipher bytes.
    pub ciphertext: Vec<u8>,
    /// Input proof binding the ciphertext to target and principal.
    pub proof: Vec<u8>,
}

/// Request handed to the cipher engine's verify-reveal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealRequest {
    /// Handles to decrypt.
    pub handles: Vec<CipherHandle>,
    /// Ledger instance the proof is relayed to.
    pub target: ContractAddress,
}

/// Clear values encoded for the ledger's verification entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedClearValues(pub Vec<u8>);

/// Decryption proof relayed alongside the clear values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealProof(pub Vec<u8>);

/// Result of a completed verify-reveal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealResult {
    /// Clear value per handle.
    pub clear_values: HashMap<CipherHandle, u64>,
}

impl RevealResult {
    /// Clear value resolved for `handle`, if any.
    pub fn value_for(&self, handle: &CipherHandle) -> Option<u64> {
        self.clear_values.get(handle).copied()
    }
}

/// Ledger transaction hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Transaction accepted by the ledger but not yet confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTx {
    /// Transaction hash.
    pub hash: TxHash,
}

/// Confirmation of an included transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash.
    pub hash: TxHash,
    /// Inclusion height.
    pub block: u64,
}
