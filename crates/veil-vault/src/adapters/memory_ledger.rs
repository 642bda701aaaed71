//! In-Memory Ledger Adapter
//!
//! Implements `LedgerReader` and, through [`MemorySigner`], `LedgerSigner`
//! over a process-local record table. Used by tests and by hosts running
//! without a live ledger. Failures can be injected per record or globally.

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;
use tracing::debug;

use crate::algorithms::decode_clear_values;
use crate::domain::{
    CipherHandle, ContractAddress, CreateRecordRequest, EncodedClearValues, LedgerError,
    LedgerRecord, PendingTx, Principal, RecordId, RevealProof, TxHash, TxReceipt,
};
use crate::ports::{LedgerReader, LedgerSigner};

const DEFAULT_ADDRESS: &str = "0x00000000000000000000000000000000000000e1";

#[derive(Clone, Debug)]
struct StoredRecord {
    fields: LedgerRecord,
    handle: CipherHandle,
}

#[derive(Debug)]
struct LedgerInner {
    order: Vec<RecordId>,
    records: HashMap<RecordId, StoredRecord>,
    failing: HashSet<RecordId>,
    verify_on_submission: HashMap<RecordId, u64>,
    available: bool,
    unreachable: bool,
    reject_signatures: bool,
    last_create: Option<CreateRecordRequest>,
    block: u64,
    tx_nonce: u64,
    list_calls: usize,
    get_record_calls: usize,
    create_calls: usize,
    reveal_submissions: usize,
    list_gate: Option<Arc<Notify>>,
    list_entered: Arc<Notify>,
}

impl Default for LedgerInner {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            records: HashMap::new(),
            failing: HashSet::new(),
            verify_on_submission: HashMap::new(),
            available: true,
            unreachable: false,
            reject_signatures: false,
            last_create: None,
            block: 0,
            tx_nonce: 0,
            list_calls: 0,
            get_record_calls: 0,
            create_calls: 0,
            reveal_submissions: 0,
            list_gate: None,
            list_entered: Arc::new(Notify::new()),
        }
    }
}

impl LedgerInner {
    fn reachable(&self) -> Result<(), LedgerError> {
        if self.unreachable {
            return Err(LedgerError::Unreachable("ledger offline".to_string()));
        }
        Ok(())
    }

    fn authorize(&self) -> Result<(), LedgerError> {
        self.reachable()?;
        if self.reject_signatures {
            return Err(LedgerError::UserRejected);
        }
        Ok(())
    }

    fn next_tx(&mut self) -> PendingTx {
        self.tx_nonce += 1;
        let digest = Sha256::digest(self.tx_nonce.to_be_bytes());
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        PendingTx { hash: TxHash(hash) }
    }

    fn stored(&self, id: &RecordId) -> Result<&StoredRecord, LedgerError> {
        self.reachable()?;
        if self.failing.contains(id) {
            return Err(LedgerError::Unreachable(format!("fetch of {id} failed")));
        }
        self.records
            .get(id)
            .ok_or_else(|| LedgerError::RecordNotFound(id.clone()))
    }
}

/// Process-local ledger.
///
/// Clones share the same table.
#[derive(Clone, Debug)]
pub struct InMemoryLedger {
    inner: Arc<Mutex<LedgerInner>>,
    address: ContractAddress,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    /// Create an empty, available ledger.
    pub fn new() -> Self {
        Self::at(ContractAddress::new(DEFAULT_ADDRESS))
    }

    /// Create an empty ledger bound at `address`.
    pub fn at(address: ContractAddress) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LedgerInner::default())),
            address,
        }
    }

    /// Address of this ledger instance.
    pub fn contract_address(&self) -> ContractAddress {
        self.address.clone()
    }

    /// Signer for `principal` over this ledger.
    pub fn signer_for(&self, principal: Principal) -> Arc<MemorySigner> {
        Arc::new(MemorySigner {
            ledger: self.clone(),
            principal,
        })
    }

    /// Insert a record directly. A `verified_value` marks it verified.
    ///
    /// Its handle is derived from the id bytes.
    pub fn seed_record(
        &self,
        id: &str,
        name: &str,
        frequency: Option<i64>,
        category: Option<i64>,
        verified_value: Option<i64>,
    ) -> CipherHandle {
        let id = RecordId::new(id);
        let handle = CipherHandle::for_ciphertext(id.as_str().as_bytes());
        let fields = LedgerRecord {
            name: name.to_string(),
            public_value1: frequency,
            public_value2: category,
            decrypted_value: verified_value,
            timestamp: now_secs(),
            creator: Principal::new("0x0"),
            is_verified: verified_value.is_some(),
        };
        let mut inner = self.inner.lock();
        if !inner.records.contains_key(&id) {
            inner.order.push(id.clone());
        }
        inner.records.insert(id, StoredRecord { fields, handle });
        handle
    }

    /// Current fields of a record.
    pub fn record(&self, id: &RecordId) -> Option<LedgerRecord> {
        self.inner.lock().records.get(id).map(|r| r.fields.clone())
    }

    /// Make every fetch of `id` fail.
    pub fn fail_record(&self, id: RecordId) {
        self.inner.lock().failing.insert(id);
    }

    /// Set the availability probe result.
    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }

    /// Make every call fail as unreachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unreachable = unreachable;
    }

    /// Make every signer decline.
    pub fn reject_signatures(&self, reject: bool) {
        self.inner.lock().reject_signatures = reject;
    }

    /// Have another party confirm `id` with `value` just before the next
    /// reveal submission for it lands.
    pub fn verify_on_next_submission(&self, id: RecordId, value: u64) {
        self.inner.lock().verify_on_submission.insert(id, value);
    }

    /// Last creation request received.
    pub fn last_create_request(&self) -> Option<CreateRecordRequest> {
        self.inner.lock().last_create.clone()
    }

    /// Number of record enumerations served.
    pub fn list_calls(&self) -> usize {
        self.inner.lock().list_calls
    }

    /// Number of record fetches served.
    pub fn get_record_calls(&self) -> usize {
        self.inner.lock().get_record_calls
    }

    /// Hold every record enumeration until `gate` is notified.
    pub fn gate_listing(&self, gate: Arc<Notify>) {
        self.inner.lock().list_gate = Some(gate);
    }

    /// Wait until a gated enumeration has started.
    pub async fn listing_started(&self) {
        let entered = Arc::clone(&self.inner.lock().list_entered);
        entered.notified().await;
    }

    /// Number of creation submissions received.
    pub fn create_calls(&self) -> usize {
        self.inner.lock().create_calls
    }

    /// Number of reveal submissions received.
    pub fn reveal_submissions(&self) -> usize {
        self.inner.lock().reveal_submissions
    }

    fn create(
        &self,
        creator: &Principal,
        request: CreateRecordRequest,
    ) -> Result<PendingTx, LedgerError> {
        let mut inner = self.inner.lock();
        inner.authorize()?;
        inner.create_calls += 1;
        if inner.records.contains_key(&request.id) {
            return Err(LedgerError::Reverted(format!(
                "record {} already exists",
                request.id
            )));
        }

        let stored = StoredRecord {
            fields: LedgerRecord {
                name: request.name.clone(),
                public_value1: Some(i64::from(request.frequency)),
                public_value2: Some(i64::from(request.category_index)),
                decrypted_value: None,
                timestamp: now_secs(),
                creator: creator.clone(),
                is_verified: false,
            },
            handle: CipherHandle::for_ciphertext(&request.payload.ciphertext),
        };
        debug!("[veil] Ledger stored record {}", request.id);
        inner.order.push(request.id.clone());
        inner.records.insert(request.id.clone(), stored);
        inner.last_create = Some(request);
        Ok(inner.next_tx())
    }

    fn reveal(
        &self,
        id: &RecordId,
        clear_values: &EncodedClearValues,
        proof: &RevealProof,
    ) -> Result<PendingTx, LedgerError> {
        let mut inner = self.inner.lock();
        inner.authorize()?;
        inner.reveal_submissions += 1;

        if let Some(value) = inner.verify_on_submission.remove(id) {
            if let Some(stored) = inner.records.get_mut(id) {
                stored.fields.decrypted_value = i64::try_from(value).ok();
                stored.fields.is_verified = true;
            }
        }

        let stored = inner
            .records
            .get_mut(id)
            .ok_or_else(|| LedgerError::RecordNotFound(id.clone()))?;
        if stored.fields.is_verified {
            return Err(LedgerError::AlreadyVerified(id.clone()));
        }
        if proof.0.is_empty() {
            return Err(LedgerError::Reverted("missing decryption proof".to_string()));
        }

        let value = decode_clear_values(clear_values)?
            .first()
            .copied()
            .ok_or_else(|| LedgerError::InvalidClearValues("no values".to_string()))?;
        let value = i64::try_from(value)
            .map_err(|_| LedgerError::InvalidClearValues(format!("{value} out of range")))?;
        stored.fields.decrypted_value = Some(value);
        stored.fields.is_verified = true;
        debug!("[veil] Ledger verified record {}", id);
        Ok(inner.next_tx())
    }

    fn confirm(&self, tx: PendingTx) -> Result<TxReceipt, LedgerError> {
        let mut inner = self.inner.lock();
        inner.reachable()?;
        inner.block += 1;
        Ok(TxReceipt {
            hash: tx.hash,
            block: inner.block,
        })
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn is_available(&self) -> Result<bool, LedgerError> {
        let inner = self.inner.lock();
        inner.reachable()?;
        Ok(inner.available)
    }

    async fn list_record_ids(&self) -> Result<Vec<RecordId>, LedgerError> {
        let gate = {
            let mut inner = self.inner.lock();
            inner.list_calls += 1;
            inner
                .list_gate
                .clone()
                .map(|gate| (gate, Arc::clone(&inner.list_entered)))
        };
        if let Some((gate, entered)) = gate {
            entered.notify_one();
            gate.notified().await;
        }
        let inner = self.inner.lock();
        inner.reachable()?;
        Ok(inner.order.clone())
    }

    async fn get_record(&self, id: &RecordId) -> Result<LedgerRecord, LedgerError> {
        let mut inner = self.inner.lock();
        inner.get_record_calls += 1;
        inner.stored(id).map(|r| r.fields.clone())
    }

    async fn get_encrypted_handle(&self, id: &RecordId) -> Result<CipherHandle, LedgerError> {
        self.inner.lock().stored(id).map(|r| r.handle)
    }

    async fn address(&self) -> Result<ContractAddress, LedgerError> {
        Ok(self.address.clone())
    }
}

/// Signer bound to one principal over an [`InMemoryLedger`].
#[derive(Debug)]
pub struct MemorySigner {
    ledger: InMemoryLedger,
    principal: Principal,
}

#[async_trait]
impl LedgerSigner for MemorySigner {
    fn principal(&self) -> &Principal {
        &self.principal
    }

    async fn create_record(&self, request: CreateRecordRequest) -> Result<PendingTx, LedgerError> {
        self.ledger.create(&self.principal, request)
    }

    async fn submit_reveal(
        &self,
        id: &RecordId,
        clear_values: EncodedClearValues,
        proof: RevealProof,
    ) -> Result<PendingTx, LedgerError> {
        self.ledger.reveal(id, &clear_values, &proof)
    }

    async fn wait_for_confirmation(&self, tx: PendingTx) -> Result<TxReceipt, LedgerError> {
        self.ledger.confirm(tx)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
