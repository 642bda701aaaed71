//! # Reveal Coordinator
//!
//! Drives one reveal attempt:
//!
//! ```text
//! NotRequested -> fetch record -> AlreadyVerified                      [stored value]
//!                              -> NeedsReveal -> ProofRequested
//!                                 -> ProofSubmitted -> Verified           [clear value]
//!                                                   -> Failed
//! ```
//!
//! Already-verified records never reach the cipher engine. The proof is
//! pushed to the ledger by the engine itself through [`LedgerRevealSubmitter`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use veil_telemetry::{log_record_event, REVEALS};

use super::flight::FlightFlag;
use super::state::{Connection, SessionState};
use super::sync::SyncController;
use crate::domain::{
    ActivityAction, CipherHandle, ContractAddress, EncodedClearValues, LedgerError, NoticePhase,
    OperationKind, RecordId, RevealOutcome, RevealProof, RevealRequest, TxReceipt, VaultError,
};
use crate::ports::{CipherEngine, LedgerReader, LedgerSigner, RevealSubmitter};

const MSG_VERIFYING: &str = "Verifying decryption...";
const MSG_VERIFIED: &str = "Decryption verified!";
const MSG_ALREADY_VERIFIED: &str = "Data already verified";

/// Submit callback relaying a reveal proof for one record through the signer.
pub struct LedgerRevealSubmitter {
    signer: Arc<dyn LedgerSigner>,
    record_id: RecordId,
}

impl LedgerRevealSubmitter {
    /// Relay proofs for `record_id` through `signer`.
    pub fn new(signer: Arc<dyn LedgerSigner>, record_id: RecordId) -> Self {
        Self { signer, record_id }
    }
}

#[async_trait]
impl RevealSubmitter for LedgerRevealSubmitter {
    async fn submit(
        &self,
        clear_values: EncodedClearValues,
        proof: RevealProof,
    ) -> Result<TxReceipt, LedgerError> {
        let pending = self
            .signer
            .submit_reveal(&self.record_id, clear_values, proof)
            .await?;
        tracing::debug!(record_id = %self.record_id, tx = %pending.hash, "[veil] Reveal proof submitted");
        self.signer.wait_for_confirmation(pending).await
    }
}

/// Reveals encrypted fields, one at a time.
pub struct RevealCoordinator {
    state: Arc<SessionState>,
    reader: Arc<dyn LedgerReader>,
    cipher: Arc<dyn CipherEngine>,
    sync: Arc<SyncController>,
    flight: FlightFlag,
}

impl RevealCoordinator {
    /// Create a coordinator.
    pub fn new(
        state: Arc<SessionState>,
        reader: Arc<dyn LedgerReader>,
        cipher: Arc<dyn CipherEngine>,
        sync: Arc<SyncController>,
    ) -> Self {
        Self {
            state,
            reader,
            cipher,
            sync,
            flight: FlightFlag::new(OperationKind::Reveal),
        }
    }

    /// Whether a reveal is in flight.
    pub fn is_revealing(&self) -> bool {
        self.flight.is_active()
    }

    /// Reveal the encrypted field of `id`.
    ///
    /// A concurrent confirmation by another reveal is reported as
    /// `Ok(RevealOutcome::ConcurrentlyVerified)`, not as an error.
    pub async fn reveal(&self, id: &RecordId) -> Result<RevealOutcome, VaultError> {
        let connection = self.state.require_connection()?;
        let _flight = self.flight.try_begin()?;

        let span = tracing::info_span!("vault_reveal", op_id = %Uuid::new_v4(), record_id = %id);
        self.run(connection, id).instrument(span).await
    }

    async fn run(&self, connection: Connection, id: &RecordId) -> Result<RevealOutcome, VaultError> {
        let fields = self.reader.get_record(id).await.map_err(|e| {
            REVEALS.with_label_values(&["failed"]).inc();
            self.state.fail(VaultError::from_reveal_ledger_failure(id, e))
        })?;

        if fields.is_verified {
            let value = fields
                .decrypted_value
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(0);
            log_record_event!(debug, "reveal", "[veil] Record already verified", id, value = value);
            REVEALS.with_label_values(&["already_verified"]).inc();
            self.state.notify(NoticePhase::Success, MSG_ALREADY_VERIFIED);
            return Ok(RevealOutcome::AlreadyVerified(value));
        }

        if !self.cipher.is_initialized() {
            REVEALS.with_label_values(&["failed"]).inc();
            return Err(self.state.fail(VaultError::Initialization(
                "cipher engine not ready".to_string(),
            )));
        }
        let Some(target) = self.state.target() else {
            REVEALS.with_label_values(&["failed"]).inc();
            return Err(self.state.fail(VaultError::TargetUnavailable));
        };

        let handle = self.reader.get_encrypted_handle(id).await.map_err(|e| {
            REVEALS.with_label_values(&["failed"]).inc();
            self.state.fail(VaultError::from_reveal_ledger_failure(id, e))
        })?;

        self.state.notify(NoticePhase::Pending, MSG_VERIFYING);
        match self.verify(connection, id, handle, target).await {
            Ok(value) => {
                log_record_event!(info, "reveal", "[veil] Record revealed", id, value = value);
                REVEALS.with_label_values(&["revealed"]).inc();
                if let Err(e) = self.sync.resync().await {
                    tracing::warn!(error = %e, "[veil] Refresh after reveal failed");
                }
                self.state.log(ActivityAction::DataDecrypted {
                    habit_id: id.clone(),
                    value,
                });
                self.state.notify(NoticePhase::Success, MSG_VERIFIED);
                Ok(RevealOutcome::Revealed(value))
            }
            Err(err) if err.is_already_verified_race() => {
                log_record_event!(info, "reveal", "[veil] Record verified concurrently", id);
                REVEALS.with_label_values(&["race"]).inc();
                self.state.notify(NoticePhase::Success, MSG_ALREADY_VERIFIED);
                if let Err(e) = self.sync.resync().await {
                    tracing::warn!(error = %e, "[veil] Refresh after reveal failed");
                }
                Ok(RevealOutcome::ConcurrentlyVerified)
            }
            Err(err) => {
                log_record_event!(warn, "reveal", "[veil] Reveal failed", id, error = %err);
                REVEALS.with_label_values(&["failed"]).inc();
                Err(self.state.fail(err))
            }
        }
    }

    async fn verify(
        &self,
        connection: Connection,
        id: &RecordId,
        handle: CipherHandle,
        target: ContractAddress,
    ) -> Result<u64, VaultError> {
        let submitter = LedgerRevealSubmitter::new(connection.signer, id.clone());
        let request = RevealRequest {
            handles: vec![handle],
            target,
        };
        let result = self
            .cipher
            .verify_reveal(request, &submitter)
            .await
            .map_err(|e| VaultError::from_reveal_failure(id, e))?;

        result.value_for(&handle).ok_or_else(|| {
            VaultError::Decryption(format!("no clear value returned for handle {handle}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DeterministicCipherEngine, InMemoryLedger};
    use crate::config::VaultConfig;
    use crate::domain::Principal;
    use tokio_test::assert_ok;

    struct Fixture {
        ledger: InMemoryLedger,
        cipher: Arc<DeterministicCipherEngine>,
        state: Arc<SessionState>,
        reveal: RevealCoordinator,
    }

    async fn fixture(cipher: DeterministicCipherEngine) -> Fixture {
        let ledger = InMemoryLedger::new();
        let cipher = Arc::new(cipher);
        assert_ok!(cipher.initialize().await);

        let state = Arc::new(SessionState::new(VaultConfig::for_testing()));
        let principal = Principal::new("0xabc");
        state.bind(Connection {
            principal: principal.clone(),
            signer: ledger.signer_for(principal),
        });
        state.set_target(ledger.contract_address());

        let reader: Arc<dyn LedgerReader> = Arc::new(ledger.clone());
        let sync = Arc::new(SyncController::new(Arc::clone(&state), Arc::clone(&reader)));
        let reveal = RevealCoordinator::new(
            Arc::clone(&state),
            reader,
            Arc::clone(&cipher) as Arc<dyn CipherEngine>,
            sync,
        );
        Fixture {
            ledger,
            cipher,
            state,
            reveal,
        }
    }

    #[tokio::test]
    async fn test_already_verified_short_circuits() {
        let f = fixture(DeterministicCipherEngine::new()).await;
        f.ledger.seed_record("h1", "Read", Some(1), Some(0), Some(7));

        let outcome = assert_ok!(f.reveal.reveal(&RecordId::new("h1")).await);
        assert_eq!(outcome, RevealOutcome::AlreadyVerified(7));
        assert_eq!(f.cipher.verify_calls(), 0);
        assert_eq!(f.ledger.reveal_submissions(), 0);
        assert_eq!(f.state.status().current().message, "Data already verified");
    }

    #[tokio::test]
    async fn test_reveal_updates_cache() {
        let f = fixture(DeterministicCipherEngine::new().with_clear_value(42)).await;
        f.ledger.seed_record("h1", "Read", Some(1), Some(0), None);

        let outcome = assert_ok!(f.reveal.reveal(&RecordId::new("h1")).await);
        assert_eq!(outcome, RevealOutcome::Revealed(42));

        let cached = f.state.records().get(&RecordId::new("h1")).unwrap();
        assert_eq!(cached.streak_public, 42);
        assert!(cached.verified);
        assert_eq!(f.state.activity().entries()[0].action.tag(), "DATA_DECRYPTED");
        assert_eq!(f.state.status().current().message, "Decryption verified!");
        assert!(!f.reveal.is_revealing());
    }

    #[tokio::test]
    async fn test_race_treated_as_success() {
        let f = fixture(DeterministicCipherEngine::new().with_clear_value(5)).await;
        f.ledger.seed_record("h1", "Read", Some(1), Some(0), None);
        f.ledger.verify_on_next_submission(RecordId::new("h1"), 5);

        let outcome = assert_ok!(f.reveal.reveal(&RecordId::new("h1")).await);
        assert_eq!(outcome, RevealOutcome::ConcurrentlyVerified);
        assert_eq!(f.state.status().current().phase, NoticePhase::Success);
        let cached = f.state.records().get(&RecordId::new("h1")).unwrap();
        assert!(cached.verified);
    }

    #[tokio::test]
    async fn test_generic_failure_emits_decryption_notice() {
        let cipher = DeterministicCipherEngine::new();
        cipher.fail_reveal(true);
        let f = fixture(cipher).await;
        f.ledger.seed_record("h1", "Read", Some(1), Some(0), None);

        let err = f.reveal.reveal(&RecordId::new("h1")).await.unwrap_err();
        assert!(matches!(err, VaultError::Decryption(_)));
        assert_eq!(f.state.status().current().message, "Decryption failed");
        assert!(f.state.records().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_submission_reported_as_rejection() {
        let f = fixture(DeterministicCipherEngine::new().with_clear_value(3)).await;
        f.ledger.seed_record("h1", "Read", Some(1), Some(0), None);
        f.ledger.reject_signatures(true);

        let err = f.reveal.reveal(&RecordId::new("h1")).await.unwrap_err();
        assert_eq!(err, VaultError::UserRejected);
    }

    #[tokio::test]
    async fn test_missing_target_is_reported_as_such() {
        let f = fixture(DeterministicCipherEngine::new()).await;
        f.ledger.seed_record("h1", "Read", Some(1), Some(0), None);
        f.state.clear_target();

        let err = f.reveal.reveal(&RecordId::new("h1")).await.unwrap_err();
        assert_eq!(err, VaultError::TargetUnavailable);
        assert_eq!(f.state.status().current().message, "Ledger address unavailable");
        assert_eq!(f.cipher.verify_calls(), 0);
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let f = fixture(DeterministicCipherEngine::new()).await;
        f.state.unbind();

        let err = f.reveal.reveal(&RecordId::new("h1")).await.unwrap_err();
        assert_eq!(err, VaultError::AuthenticationRequired);
        assert_eq!(f.ledger.get_record_calls(), 0);
    }
}
