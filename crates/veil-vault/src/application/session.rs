//! # Vault Session
//!
//! The controller a host application holds: owns the session state and
//! composes the sync, creation and reveal coordinators around it.

use async_trait::async_trait;
use std::sync::Arc;

use veil_telemetry::RECORDS_LOADED;

use super::bootstrap::{BootstrapState, CipherBootstrap};
use super::creation::CreationCoordinator;
use super::reveal::RevealCoordinator;
use super::state::{Connection, SessionState};
use super::sync::SyncController;
use crate::algorithms::compute_stats;
use crate::config::VaultConfig;
use crate::domain::{
    ActivityEntry, HabitDraft, Principal, Record, RecordId, RecordStats, RevealOutcome,
    StatusNotice, SyncReport, VaultError,
};
use crate::ports::{CipherEngine, LedgerReader, LedgerSigner, VaultApi};

/// Vault session - implements [`VaultApi`].
pub struct VaultSession {
    state: Arc<SessionState>,
    reader: Arc<dyn LedgerReader>,
    cipher: Arc<dyn CipherEngine>,
    bootstrap: CipherBootstrap,
    sync: Arc<SyncController>,
    creation: CreationCoordinator,
    reveal: RevealCoordinator,
}

impl VaultSession {
    /// Create a disconnected session over a ledger reader and cipher engine.
    pub fn new(
        config: VaultConfig,
        reader: Arc<dyn LedgerReader>,
        cipher: Arc<dyn CipherEngine>,
    ) -> Self {
        let state = Arc::new(SessionState::new(config));
        let sync = Arc::new(SyncController::new(Arc::clone(&state), Arc::clone(&reader)));
        let creation =
            CreationCoordinator::new(Arc::clone(&state), Arc::clone(&cipher), Arc::clone(&sync));
        let reveal = RevealCoordinator::new(
            Arc::clone(&state),
            Arc::clone(&reader),
            Arc::clone(&cipher),
            Arc::clone(&sync),
        );
        Self {
            state,
            reader,
            cipher,
            bootstrap: CipherBootstrap::new(),
            sync,
            creation,
            reveal,
        }
    }

    /// Session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Connected principal, if any.
    pub fn principal(&self) -> Option<Principal> {
        self.state.principal()
    }

    /// Whether a user-initiated refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.sync.is_refreshing()
    }

    /// Whether any record load is running, including follow-up refreshes.
    pub fn is_loading(&self) -> bool {
        self.sync.is_loading()
    }

    /// Whether a creation is in flight.
    pub fn is_creating(&self) -> bool {
        self.creation.is_creating()
    }

    /// Whether a reveal is in flight.
    pub fn is_revealing(&self) -> bool {
        self.reveal.is_revealing()
    }

    /// Whether the cipher engine is ready for encrypt and reveal.
    pub fn is_cipher_ready(&self) -> bool {
        self.cipher.is_initialized()
    }

    /// Current creation draft.
    pub fn draft(&self) -> HabitDraft {
        self.state.draft()
    }

    /// Replace the creation draft.
    pub fn set_draft(&self, draft: HabitDraft) {
        self.state.set_draft(draft);
    }

    /// Create a record from the current draft.
    pub async fn create_from_draft(&self) -> Result<RecordId, VaultError> {
        self.create(self.state.draft()).await
    }

    /// Initialize the cipher engine unless it is ready or already initializing.
    pub async fn initialize_cipher(&self) -> Result<BootstrapState, VaultError> {
        self.bootstrap
            .ensure_ready(self.cipher.as_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "[veil] Cipher engine initialization failed");
                self.state.fail(VaultError::Initialization(e.to_string()))
            })
    }

    async fn bind_target(&self) {
        match self.reader.address().await {
            Ok(address) => {
                tracing::debug!(address = %address, "[veil] Ledger address resolved");
                self.state.set_target(address);
            }
            Err(e) => tracing::warn!(error = %e, "[veil] Could not resolve ledger address"),
        }
    }
}

#[async_trait]
impl VaultApi for VaultSession {
    async fn connect(
        &self,
        principal: Principal,
        signer: Arc<dyn LedgerSigner>,
    ) -> Result<SyncReport, VaultError> {
        tracing::info!(principal = %principal, "[veil] Connected");
        self.state.bind(Connection { principal, signer });

        self.bind_target().await;
        match self.initialize_cipher().await {
            Ok(BootstrapState::Ready) => {}
            Ok(BootstrapState::Pending) => {
                tracing::debug!("[veil] Cipher initialization already in progress");
            }
            // Already surfaced as an error notice; loading proceeds without it.
            Err(e) => tracing::debug!(error = %e, "[veil] Loading records without cipher"),
        }

        self.sync.refresh().await
    }

    fn disconnect(&self) {
        if let Some(connection) = self.state.unbind() {
            tracing::info!(principal = %connection.principal, "[veil] Disconnected");
        }
        self.state.records().clear();
        self.state.clear_target();
        RECORDS_LOADED.set(0.0);
    }

    async fn refresh(&self) -> Result<SyncReport, VaultError> {
        self.sync.refresh().await
    }

    async fn create(&self, input: HabitDraft) -> Result<RecordId, VaultError> {
        self.creation.create(input).await
    }

    async fn reveal(&self, id: &RecordId) -> Result<RevealOutcome, VaultError> {
        self.reveal.reveal(id).await
    }

    fn records(&self) -> Vec<Record> {
        self.state.records().snapshot()
    }

    fn history(&self) -> Vec<ActivityEntry> {
        self.state.activity().entries()
    }

    fn notice(&self) -> StatusNotice {
        self.state.status().current()
    }

    fn stats(&self) -> RecordStats {
        compute_stats(&self.state.records().snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DeterministicCipherEngine, InMemoryLedger};
    use crate::domain::NoticePhase;
    use tokio_test::assert_ok;

    fn session(ledger: &InMemoryLedger, cipher: Arc<DeterministicCipherEngine>) -> VaultSession {
        VaultSession::new(VaultConfig::for_testing(), Arc::new(ledger.clone()), cipher)
    }

    #[tokio::test]
    async fn test_connect_initializes_and_loads() {
        let ledger = InMemoryLedger::new();
        ledger.seed_record("h1", "Read", Some(2), Some(4), Some(10));
        let cipher = Arc::new(DeterministicCipherEngine::new());
        let session = session(&ledger, Arc::clone(&cipher));
        let principal = Principal::new("0xabc");

        let report = assert_ok!(
            session
                .connect(principal.clone(), ledger.signer_for(principal.clone()))
                .await
        );
        assert_eq!(report.records.len(), 1);
        assert!(session.is_cipher_ready());
        assert_eq!(session.principal(), Some(principal));
        assert_eq!(session.state().target(), Some(ledger.contract_address()));

        let stats = session.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.best_streak, 10);
    }

    #[tokio::test]
    async fn test_connect_survives_cipher_failure() {
        let ledger = InMemoryLedger::new();
        ledger.seed_record("h1", "Read", Some(2), Some(4), None);
        let cipher = Arc::new(DeterministicCipherEngine::new());
        cipher.fail_initialize(true);
        let session = session(&ledger, Arc::clone(&cipher));
        let principal = Principal::new("0xabc");

        let report = assert_ok!(
            session
                .connect(principal.clone(), ledger.signer_for(principal))
                .await
        );
        assert_eq!(report.records.len(), 1);
        assert!(!session.is_cipher_ready());
        assert_eq!(session.notice().phase, NoticePhase::Error);
        assert_eq!(session.notice().message, "Cipher engine initialization failed");

        let err = session.create(HabitDraft::named("Run")).await.unwrap_err();
        assert!(matches!(err, VaultError::Initialization(_)));
    }

    #[tokio::test]
    async fn test_disconnect_blocks_operations() {
        let ledger = InMemoryLedger::new();
        let session = session(&ledger, Arc::new(DeterministicCipherEngine::new()));
        let principal = Principal::new("0xabc");
        assert_ok!(
            session
                .connect(principal.clone(), ledger.signer_for(principal))
                .await
        );

        session.disconnect();
        assert_eq!(
            session.refresh().await.unwrap_err(),
            VaultError::AuthenticationRequired
        );
        assert_eq!(
            session.reveal(&RecordId::new("h1")).await.unwrap_err(),
            VaultError::AuthenticationRequired
        );
    }

    #[tokio::test]
    async fn test_disconnect_clears_cache_and_target() {
        let ledger = InMemoryLedger::new();
        ledger.seed_record("h1", "Read", Some(2), Some(4), Some(10));
        let session = session(&ledger, Arc::new(DeterministicCipherEngine::new()));
        let principal = Principal::new("0xabc");
        assert_ok!(
            session
                .connect(principal.clone(), ledger.signer_for(principal))
                .await
        );
        assert_eq!(session.records().len(), 1);

        session.disconnect();
        assert!(session.records().is_empty());
        assert_eq!(session.stats().total, 0);
        assert_eq!(session.stats().best_streak, 0);
        assert_eq!(session.state().target(), None);
        assert_eq!(session.principal(), None);
    }

    #[tokio::test]
    async fn test_create_from_draft() {
        let ledger = InMemoryLedger::new();
        let session = session(&ledger, Arc::new(DeterministicCipherEngine::new()));
        let principal = Principal::new("0xabc");
        assert_ok!(
            session
                .connect(principal.clone(), ledger.signer_for(principal))
                .await
        );

        session.set_draft(HabitDraft::named("Meditate"));
        let id = assert_ok!(session.create_from_draft().await);
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].id, id);
        assert_eq!(session.draft(), HabitDraft::default());
    }
}
