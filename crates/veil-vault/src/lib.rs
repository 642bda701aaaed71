//! # Veil Vault
//!
//! Client orchestration for a vault of user-owned records that each carry
//! one confidential numeric field (a habit's streak) alongside public
//! metadata.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Keep a local cache of records in sync with a remote ledger
//! - Create records whose streak seed is encrypted before submission
//! - Reveal an encrypted field through the cipher engine's verify-reveal
//!   protocol, relaying the decryption proof to the ledger
//! - Surface every outcome as a transient status notice and a bounded
//!   activity log
//!
//! ## Flow Guarantees
//!
//! | Guarantee | Description |
//! |-----------|-------------|
//! | Single flight | One refresh, one creation and one reveal at a time per session |
//! | Ordered refresh | Records fetched sequentially, in ledger order |
//! | Isolated failures | A record that fails to load is skipped, not fatal |
//! | No redundant proofs | Verified records short-circuit before the cipher engine |
//! | Latest notice wins | Stale dismissal timers never clear a newer notice |
//!
//! ## Module Structure
//!
//! ```text
//! veil-vault/
//! ├── domain/          # Records, activity, notices, errors, invariants
//! ├── algorithms/      # Record mapping, id generation, clear values, stats
//! ├── ports/           # VaultApi (inbound) + ledger/cipher traits (outbound)
//! ├── application/     # Session state and the coordinators, VaultSession
//! ├── adapters/        # In-memory ledger, deterministic cipher engine
//! └── config.rs        # VaultConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{DeterministicCipherEngine, InMemoryLedger, MemorySigner};
pub use algorithms::{
    compute_stats, decode_clear_values, encode_clear_values, generate_record_id,
    map_ledger_record,
};
pub use application::{
    BootstrapState, CreationCoordinator, RevealCoordinator, SessionState, StatusMachine,
    SyncController, VaultSession,
};
pub use config::VaultConfig;
pub use domain::{
    category_index, ActivityAction, ActivityEntry, Category, CipherError, CipherHandle,
    ContractAddress, HabitDraft, LedgerError, LedgerRecord, NoticePhase, OperationKind, Principal,
    Record, RecordId, RecordStats, RevealOutcome, StatusNotice, SyncReport, VaultError,
    CATEGORY_COUNT, HISTORY_CAPACITY,
};
pub use ports::{CipherEngine, LedgerReader, LedgerSigner, RevealSubmitter, VaultApi};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
