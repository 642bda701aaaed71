//! # Outbound Ports
//!
//! Traits for the external collaborators: the ledger client (read-only and
//! signer variants) and the cipher engine.

use async_trait::async_trait;

use crate::domain::{
    CipherError, CipherHandle, ContractAddress, CreateRecordRequest, EncodedClearValues,
    EncryptedPayload, LedgerError, LedgerRecord, PendingTx, Principal, RecordId, RevealProof,
    RevealRequest, RevealResult, TxReceipt,
};

/// Read-only ledger client - outbound port.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Probe whether the record store is available.
    async fn is_available(&self) -> Result<bool, LedgerError>;

    /// Enumerate all record ids, in ledger order.
    async fn list_record_ids(&self) -> Result<Vec<RecordId>, LedgerError>;

    /// Fetch one record's fields.
    async fn get_record(&self, id: &RecordId) -> Result<LedgerRecord, LedgerError>;

    /// Fetch the handle of a record's encrypted field.
    async fn get_encrypted_handle(&self, id: &RecordId) -> Result<CipherHandle, LedgerError>;

    /// Address of the bound ledger instance.
    async fn address(&self) -> Result<ContractAddress, LedgerError>;
}

/// Signer-capable ledger client, bound to one principal - outbound port.
#[async_trait]
pub trait LedgerSigner: Send + Sync {
    /// Principal whose authorization this signer obtains.
    fn principal(&self) -> &Principal;

    /// Submit a new record. Fails with `UserRejected` if the signer declines.
    async fn create_record(&self, request: CreateRecordRequest) -> Result<PendingTx, LedgerError>;

    /// Submit clear values and their decryption proof for a record.
    ///
    /// Fails with `AlreadyVerified` if the record was confirmed already.
    async fn submit_reveal(
        &self,
        id: &RecordId,
        clear_values: EncodedClearValues,
        proof: RevealProof,
    ) -> Result<PendingTx, LedgerError>;

    /// Suspend until the transaction is included.
    async fn wait_for_confirmation(&self, tx: PendingTx) -> Result<TxReceipt, LedgerError>;
}

/// Submit callback handed to the cipher engine's verify-reveal.
///
/// The engine calls it once the decryption proof is computed; it returns
/// after the ledger has confirmed the submission.
#[async_trait]
pub trait RevealSubmitter: Send + Sync {
    /// Relay clear values and proof to the ledger and await confirmation.
    async fn submit(
        &self,
        clear_values: EncodedClearValues,
        proof: RevealProof,
    ) -> Result<TxReceipt, LedgerError>;
}

/// Encryption and proof engine - outbound port.
#[async_trait]
pub trait CipherEngine: Send + Sync {
    /// Prepare the engine. Idempotent; must complete before encrypt or reveal.
    async fn initialize(&self) -> Result<(), CipherError>;

    /// Whether `initialize` has completed.
    fn is_initialized(&self) -> bool;

    /// Encrypt `value` for `(target, principal)`, producing a single-use payload.
    async fn encrypt(
        &self,
        target: &ContractAddress,
        principal: &Principal,
        value: u64,
    ) -> Result<EncryptedPayload, CipherError>;

    /// Decrypt the requested handles, relay the proof through `submitter`,
    /// and return the clear values once the submission is confirmed.
    async fn verify_reveal(
        &self,
        request: RevealRequest,
        submitter: &dyn RevealSubmitter,
    ) -> Result<RevealResult, CipherError>;
}
