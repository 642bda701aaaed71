//! # Inbound Ports
//!
//! API trait defining what the vault client can do for its host application.

use async_trait::async_trait;
use std::sync::Arc;

use super::outbound::LedgerSigner;
use crate::domain::{
    ActivityEntry, HabitDraft, Principal, Record, RecordId, RecordStats, RevealOutcome,
    StatusNotice, SyncReport, VaultError,
};

/// Vault API - inbound port.
///
/// Every failure has already been turned into a status notice by the time
/// an `Err` is returned.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// Connection event: bind principal and signer, initialize the cipher
    /// engine, and load the records.
    async fn connect(
        &self,
        principal: Principal,
        signer: Arc<dyn LedgerSigner>,
    ) -> Result<SyncReport, VaultError>;

    /// Drop the principal and signer.
    fn disconnect(&self);

    /// Rebuild the record cache from the ledger.
    async fn refresh(&self) -> Result<SyncReport, VaultError>;

    /// Create a record with an encrypted streak seed.
    async fn create(&self, input: HabitDraft) -> Result<RecordId, VaultError>;

    /// Reveal a record's encrypted field.
    async fn reveal(&self, id: &RecordId) -> Result<RevealOutcome, VaultError>;

    /// Cached records.
    fn records(&self) -> Vec<Record>;

    /// Activity log, newest first.
    fn history(&self) -> Vec<ActivityEntry>;

    /// Current status notice.
    fn notice(&self) -> StatusNotice;

    /// Summary figures over the cached records.
    fn stats(&self) -> RecordStats;
}
