//! Deterministic Cipher Engine Adapter
//!
//! Stand-in for a homomorphic encryption engine. Ciphertexts are digests
//! that remember their clear value, so a reveal returns exactly what was
//! encrypted (or a fixed override). Proofs are digests too; nothing here is
//! confidential.

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

use crate::algorithms::encode_clear_values;
use crate::domain::{
    CipherError, CipherHandle, ContractAddress, EncryptedPayload, Principal, RevealProof,
    RevealRequest, RevealResult,
};
use crate::ports::{CipherEngine, RevealSubmitter};

/// Deterministic, non-confidential cipher engine.
#[derive(Debug, Default)]
pub struct DeterministicCipherEngine {
    initialized: AtomicBool,
    fail_initialize: AtomicBool,
    fail_reveal: AtomicBool,
    clear_value: Option<u64>,
    values: Mutex<HashMap<CipherHandle, u64>>,
    nonce: AtomicU64,
    init_gate: Option<Arc<Notify>>,
    reveal_gate: Option<Arc<Notify>>,
    reveal_entered: Arc<Notify>,
    encrypt_gate: Option<Arc<Notify>>,
    encrypt_entered: Arc<Notify>,
    initialize_calls: AtomicUsize,
    encrypt_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl DeterministicCipherEngine {
    /// Create an uninitialized engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every handle to `value` on reveal.
    pub fn with_clear_value(mut self, value: u64) -> Self {
        self.clear_value = Some(value);
        self
    }

    /// Hold `initialize` until `gate` is notified.
    pub fn with_init_gate(mut self, gate: Arc<Notify>) -> Self {
        self.init_gate = Some(gate);
        self
    }

    /// Hold `verify_reveal` (before it submits) until `gate` is notified.
    pub fn with_reveal_gate(mut self, gate: Arc<Notify>) -> Self {
        self.reveal_gate = Some(gate);
        self
    }

    /// Hold `encrypt` until `gate` is notified.
    pub fn with_encrypt_gate(mut self, gate: Arc<Notify>) -> Self {
        self.encrypt_gate = Some(gate);
        self
    }

    /// Make `initialize` fail.
    pub fn fail_initialize(&self, fail: bool) {
        self.fail_initialize.store(fail, Ordering::SeqCst);
    }

    /// Make `verify_reveal` fail before submitting.
    pub fn fail_reveal(&self, fail: bool) {
        self.fail_reveal.store(fail, Ordering::SeqCst);
    }

    /// Wait until a `verify_reveal` call has started.
    pub async fn reveal_started(&self) {
        self.reveal_entered.notified().await;
    }

    /// Wait until a gated `encrypt` call has started.
    pub async fn encrypt_started(&self) {
        self.encrypt_entered.notified().await;
    }

    /// Number of `initialize` calls.
    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    /// Number of `encrypt` calls.
    pub fn encrypt_calls(&self) -> usize {
        self.encrypt_calls.load(Ordering::SeqCst)
    }

    /// Number of `verify_reveal` calls.
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    fn ensure_initialized(&self) -> Result<(), CipherError> {
        if !self.is_initialized() {
            return Err(CipherError::NotInitialized);
        }
        Ok(())
    }

    fn resolve(&self, handle: &CipherHandle) -> Result<u64, CipherError> {
        if let Some(value) = self.clear_value {
            return Ok(value);
        }
        self.values
            .lock()
            .get(handle)
            .copied()
            .ok_or_else(|| CipherError::Reveal(format!("unknown handle {handle}")))
    }
}

#[async_trait]
impl CipherEngine for DeterministicCipherEngine {
    async fn initialize(&self) -> Result<(), CipherError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.init_gate {
            gate.notified().await;
        }
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(CipherError::Initialization("engine unavailable".to_string()));
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn encrypt(
        &self,
        target: &ContractAddress,
        principal: &Principal,
        value: u64,
    ) -> Result<EncryptedPayload, CipherError> {
        self.ensure_initialized()?;
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.encrypt_gate {
            self.encrypt_entered.notify_one();
            gate.notified().await;
        }
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);

        let ciphertext = Sha256::new()
            .chain_update(target.as_str().as_bytes())
            .chain_update(principal.as_str().as_bytes())
            .chain_update(value.to_be_bytes())
            .chain_update(nonce.to_be_bytes())
            .finalize()
            .to_vec();
        let proof = Sha256::new()
            .chain_update(b"input-proof")
            .chain_update(&ciphertext)
            .finalize()
            .to_vec();

        self.values
            .lock()
            .insert(CipherHandle::for_ciphertext(&ciphertext), value);
        Ok(EncryptedPayload { ciphertext, proof })
    }

    async fn verify_reveal(
        &self,
        request: RevealRequest,
        submitter: &dyn RevealSubmitter,
    ) -> Result<RevealResult, CipherError> {
        self.ensure_initialized()?;
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.reveal_entered.notify_one();
        if let Some(gate) = &self.reveal_gate {
            gate.notified().await;
        }
        if self.fail_reveal.load(Ordering::SeqCst) {
            return Err(CipherError::Reveal("decryption oracle refused".to_string()));
        }

        let mut clear_values = HashMap::with_capacity(request.handles.len());
        let mut ordered = Vec::with_capacity(request.handles.len());
        for handle in &request.handles {
            let value = self.resolve(handle)?;
            clear_values.insert(*handle, value);
            ordered.push(value);
        }

        let encoded = encode_clear_values(&ordered);
        let proof = Sha256::new()
            .chain_update(b"decryption-proof")
            .chain_update(request.target.as_str().as_bytes())
            .chain_update(&encoded.0)
            .finalize()
            .to_vec();

        let receipt = submitter.submit(encoded, RevealProof(proof)).await?;
        debug!("[veil] Reveal confirmed in block {}", receipt.block);
        Ok(RevealResult { clear_values })
    }
}
