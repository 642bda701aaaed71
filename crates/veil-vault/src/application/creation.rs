//! # Creation Coordinator
//!
//! Encrypts the streak seed, submits the new record through the signer and
//! waits for confirmation. Only the seed is confidential; every other field
//! is submitted in clear.

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use veil_telemetry::{log_record_event, RECORDS_CREATED};

use super::flight::FlightFlag;
use super::state::{Connection, SessionState};
use super::sync::SyncController;
use crate::algorithms::generate_record_id;
use crate::domain::{
    invariant_name_present, ActivityAction, ContractAddress, CreateRecordRequest, HabitDraft,
    NoticePhase, OperationKind, RecordId, TxReceipt, VaultError,
};
use crate::ports::CipherEngine;

const MSG_ENCRYPTING: &str = "Creating habit with encryption...";
const MSG_CONFIRMING: &str = "Waiting for transaction confirmation...";
const MSG_CREATED: &str = "Habit created with encrypted streak!";

/// Creates records, one at a time.
pub struct CreationCoordinator {
    state: Arc<SessionState>,
    cipher: Arc<dyn CipherEngine>,
    sync: Arc<SyncController>,
    flight: FlightFlag,
}

impl CreationCoordinator {
    /// Create a coordinator.
    pub fn new(
        state: Arc<SessionState>,
        cipher: Arc<dyn CipherEngine>,
        sync: Arc<SyncController>,
    ) -> Self {
        Self {
            state,
            cipher,
            sync,
            flight: FlightFlag::new(OperationKind::Create),
        }
    }

    /// Whether a creation is in flight.
    pub fn is_creating(&self) -> bool {
        self.flight.is_active()
    }

    /// Create a record from `input` and refresh the cache.
    ///
    /// # Errors
    /// - `AuthenticationRequired` without a connected principal
    /// - `Validation` if the name is blank (nothing is encrypted or submitted)
    /// - `OperationInProgress` while another creation is in flight
    /// - `Initialization` if the cipher engine is not ready
    /// - `TargetUnavailable` if the ledger address was never resolved
    /// - `UserRejected` if the signer declines
    /// - `Creation` for any other failure
    pub async fn create(&self, input: HabitDraft) -> Result<RecordId, VaultError> {
        let connection = self.state.require_connection()?;
        invariant_name_present(&input.name).map_err(|e| self.state.fail(e))?;
        let _flight = self.flight.try_begin()?;
        let target = self.ready_target()?;

        let id = generate_record_id(&self.state.config().record_id_prefix);
        let span = tracing::info_span!("vault_create", op_id = %Uuid::new_v4(), record_id = %id);
        self.run(connection, target, id, input).instrument(span).await
    }

    fn ready_target(&self) -> Result<ContractAddress, VaultError> {
        if !self.cipher.is_initialized() {
            return Err(self.state.fail(VaultError::Initialization(
                "cipher engine not initialized".to_string(),
            )));
        }
        self.state
            .target()
            .ok_or_else(|| self.state.fail(VaultError::TargetUnavailable))
    }

    async fn run(
        &self,
        connection: Connection,
        target: ContractAddress,
        id: RecordId,
        input: HabitDraft,
    ) -> Result<RecordId, VaultError> {
        self.state.notify(NoticePhase::Pending, MSG_ENCRYPTING);

        match self.submit(&connection, &target, &id, &input).await {
            Ok(receipt) => {
                log_record_event!(
                    info,
                    "create",
                    "[veil] Record created",
                    id,
                    block = receipt.block
                );
                RECORDS_CREATED.with_label_values(&["confirmed"]).inc();
                self.state.log(ActivityAction::HabitCreated {
                    name: input.name,
                    streak: input.streak_seed,
                });
                self.state.reset_draft();
                self.state.notify(NoticePhase::Success, MSG_CREATED);

                if let Err(e) = self.sync.resync().await {
                    tracing::warn!(error = %e, "[veil] Refresh after creation failed");
                }
                Ok(id)
            }
            Err(err) => {
                let outcome = match err {
                    VaultError::UserRejected => "rejected",
                    _ => "failed",
                };
                RECORDS_CREATED.with_label_values(&[outcome]).inc();
                log_record_event!(warn, "create", "[veil] Record creation failed", id, error = %err);
                Err(self.state.fail(err))
            }
        }
    }

    async fn submit(
        &self,
        connection: &Connection,
        target: &ContractAddress,
        id: &RecordId,
        input: &HabitDraft,
    ) -> Result<TxReceipt, VaultError> {
        let payload = self
            .cipher
            .encrypt(target, &connection.principal, input.streak_seed)
            .await
            .map_err(VaultError::from_creation_failure)?;

        let request = CreateRecordRequest {
            id: id.clone(),
            name: input.name.clone(),
            payload,
            frequency: input.frequency,
            category_index: input.category.index(),
            note: self.state.config().note_for(&input.name),
        };
        let pending = connection
            .signer
            .create_record(request)
            .await
            .map_err(|e| VaultError::from_creation_failure(e.into()))?;

        self.state.notify(NoticePhase::Pending, MSG_CONFIRMING);
        connection
            .signer
            .wait_for_confirmation(pending)
            .await
            .map_err(|e| VaultError::from_creation_failure(e.into()))
    }
}
