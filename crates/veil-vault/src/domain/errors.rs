//! # Domain Errors
//!
//! One error type per boundary: the ledger client, the cipher engine, and
//! the coordinators.

use std::fmt;
use thiserror::Error;

use super::value_objects::RecordId;

/// Operation kinds guarded by a single-flight flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Full refresh of the record cache.
    Refresh,
    /// Record creation.
    Create,
    /// Verify-reveal of a record's encrypted field.
    Reveal,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Refresh => "refresh",
            OperationKind::Create => "create",
            OperationKind::Reveal => "reveal",
        };
        f.write_str(name)
    }
}

/// Errors reported by the ledger client.
///
/// Adapters map the remote store's signals onto these kinds; in particular
/// `AlreadyVerified` and `UserRejected` must be reported explicitly rather
/// than left in a message string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger endpoint could not be reached.
    #[error("Ledger unreachable: {0}")]
    Unreachable(String),

    /// No record with this id exists.
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    /// The signer declined to authorize the transaction.
    #[error("User rejected transaction")]
    UserRejected,

    /// The record's encrypted field was already revealed and confirmed.
    #[error("Data already verified: {0}")]
    AlreadyVerified(RecordId),

    /// The ledger rejected the call.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Clear values could not be decoded.
    #[error("Invalid clear values: {0}")]
    InvalidClearValues(String),
}

/// Errors reported by the cipher engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CipherError {
    /// `encrypt`/`verify_reveal` called before `initialize` completed.
    #[error("Cipher engine not initialized")]
    NotInitialized,

    /// Initialization failed.
    #[error("Cipher engine initialization failed: {0}")]
    Initialization(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption or proof generation failed.
    #[error("Reveal failed: {0}")]
    Reveal(String),

    /// The submit callback failed to relay the proof to the ledger.
    #[error("Proof submission failed: {0}")]
    Submission(#[from] LedgerError),
}

/// Errors surfaced at the coordinator boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    /// The cipher engine is not ready; retried on the next connection.
    #[error("Cipher engine initialization failed: {0}")]
    Initialization(String),

    /// The ledger address used as encryption and reveal target is unknown.
    #[error("Ledger address unavailable")]
    TargetUnavailable,

    /// Refresh failed before any record was fetched.
    #[error("Failed to load data: {0}")]
    LoadFailed(LedgerError),

    /// A single record could not be fetched during refresh.
    #[error("Failed to fetch record {id}: {source}")]
    RecordFetch {
        /// Record that was skipped.
        id: RecordId,
        /// Underlying ledger failure.
        source: LedgerError,
    },

    /// No connected principal.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The signer declined authorization.
    #[error("Transaction rejected")]
    UserRejected,

    /// A reveal raced with another successful reveal of the same record.
    #[error("Record {0} was already verified")]
    AlreadyVerifiedRace(RecordId),

    /// Generic reveal failure.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Generic creation failure.
    #[error("Creation failed: {0}")]
    Creation(String),

    /// Input rejected before any remote call.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// An operation of the same kind is already in flight.
    #[error("A {0} is already in progress")]
    OperationInProgress(OperationKind),
}

impl VaultError {
    /// Text shown to the user in the status notice.
    pub fn user_message(&self) -> String {
        match self {
            VaultError::Initialization(_) => "Cipher engine initialization failed".to_string(),
            VaultError::TargetUnavailable => "Ledger address unavailable".to_string(),
            VaultError::LoadFailed(_) => "Failed to load data".to_string(),
            VaultError::RecordFetch { id, .. } => format!("Failed to load record {id}"),
            VaultError::AuthenticationRequired => "Please connect an account first".to_string(),
            VaultError::UserRejected => "Transaction rejected".to_string(),
            VaultError::AlreadyVerifiedRace(_) => "Data already verified".to_string(),
            VaultError::Decryption(_) => "Decryption failed".to_string(),
            VaultError::Creation(cause) => format!("Creation failed: {cause}"),
            VaultError::Validation(reason) => reason.clone(),
            VaultError::OperationInProgress(kind) => format!("A {kind} is already in progress"),
        }
    }

    /// Classify a cipher-engine failure raised during a reveal.
    pub fn from_reveal_failure(id: &RecordId, err: CipherError) -> Self {
        match err {
            CipherError::Submission(LedgerError::AlreadyVerified(_)) => {
                VaultError::AlreadyVerifiedRace(id.clone())
            }
            CipherError::Submission(LedgerError::UserRejected) => VaultError::UserRejected,
            CipherError::NotInitialized => {
                VaultError::Initialization("cipher engine not initialized".to_string())
            }
            other => VaultError::Decryption(other.to_string()),
        }
    }

    /// Classify a ledger failure raised during a reveal.
    pub fn from_reveal_ledger_failure(id: &RecordId, err: LedgerError) -> Self {
        Self::from_reveal_failure(id, CipherError::Submission(err))
    }

    /// Classify a failure raised during creation.
    pub fn from_creation_failure(err: CipherError) -> Self {
        match err {
            CipherError::Submission(LedgerError::UserRejected) => VaultError::UserRejected,
            CipherError::NotInitialized => {
                VaultError::Initialization("cipher engine not initialized".to_string())
            }
            CipherError::Submission(ledger) => VaultError::Creation(ledger.to_string()),
            other => VaultError::Creation(other.to_string()),
        }
    }

    /// Id of the skipped record, for a per-record fetch failure.
    pub fn skipped_record(&self) -> Option<&RecordId> {
        match self {
            VaultError::RecordFetch { id, .. } => Some(id),
            _ => None,
        }
    }

    /// True for the "already verified" race, which callers treat as success.
    pub fn is_already_verified_race(&self) -> bool {
        matches!(self, VaultError::AlreadyVerifiedRace(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_wraps_ledger_error() {
        let err: CipherError = LedgerError::UserRejected.into();
        assert!(matches!(err, CipherError::Submission(LedgerError::UserRejected)));
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn test_reveal_race_classification() {
        let id = RecordId::new("habit-1");
        let err = CipherError::Submission(LedgerError::AlreadyVerified(id.clone()));
        let vault = VaultError::from_reveal_failure(&id, err);
        assert!(vault.is_already_verified_race());
        assert_eq!(vault.user_message(), "Data already verified");
    }

    #[test]
    fn test_reveal_generic_failure() {
        let id = RecordId::new("habit-1");
        let vault = VaultError::from_reveal_failure(&id, CipherError::Reveal("boom".into()));
        assert!(matches!(vault, VaultError::Decryption(_)));
        assert_eq!(vault.user_message(), "Decryption failed");
    }

    #[test]
    fn test_creation_rejection_is_distinct() {
        let rejected = VaultError::from_creation_failure(LedgerError::UserRejected.into());
        assert_eq!(rejected, VaultError::UserRejected);
        assert_eq!(rejected.user_message(), "Transaction rejected");

        let failed =
            VaultError::from_creation_failure(LedgerError::Reverted("out of gas".into()).into());
        assert!(failed.user_message().starts_with("Creation failed: "));
        assert!(failed.user_message().contains("out of gas"));
    }

    #[test]
    fn test_target_unavailable_has_own_message() {
        let err = VaultError::TargetUnavailable;
        assert_eq!(err.user_message(), "Ledger address unavailable");
        assert_ne!(
            err.user_message(),
            VaultError::Initialization("x".into()).user_message()
        );
    }

    #[test]
    fn test_record_fetch_names_skipped_record() {
        let err = VaultError::RecordFetch {
            id: RecordId::new("B"),
            source: LedgerError::Unreachable("timeout".into()),
        };
        assert_eq!(err.skipped_record(), Some(&RecordId::new("B")));
        assert!(err.to_string().contains("timeout"));
        assert_eq!(VaultError::UserRejected.skipped_record(), None);
    }

    #[test]
    fn test_operation_in_progress_message() {
        let err = VaultError::OperationInProgress(OperationKind::Reveal);
        assert!(err.to_string().contains("reveal"));
    }
}
