//! # Cipher Bootstrap
//!
//! Re-entrant initialization of the cipher engine. A second call while one
//! initialization is pending returns immediately without touching the engine.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::CipherError;
use crate::ports::CipherEngine;

/// Result of a bootstrap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapState {
    /// The engine is initialized.
    Ready,
    /// Another initialization is in progress; this call did nothing.
    Pending,
}

/// Single-flight wrapper around `CipherEngine::initialize`.
#[derive(Debug, Default)]
pub struct CipherBootstrap {
    initializing: AtomicBool,
}

struct InitGuard<'a>(&'a AtomicBool);

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CipherBootstrap {
    /// Create an idle bootstrap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an initialization is in progress.
    pub fn is_initializing(&self) -> bool {
        self.initializing.load(Ordering::Acquire)
    }

    /// Initialize `engine` unless it is ready or already being initialized.
    pub async fn ensure_ready(
        &self,
        engine: &dyn CipherEngine,
    ) -> Result<BootstrapState, CipherError> {
        if engine.is_initialized() {
            return Ok(BootstrapState::Ready);
        }
        if self
            .initializing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("[veil] Cipher initialization already pending");
            return Ok(BootstrapState::Pending);
        }
        let _guard = InitGuard(&self.initializing);

        tracing::info!("[veil] Initializing cipher engine");
        engine.initialize().await?;
        tracing::info!("[veil] Cipher engine ready");
        Ok(BootstrapState::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DeterministicCipherEngine;
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_initializes_once() {
        let engine = DeterministicCipherEngine::new();
        let bootstrap = CipherBootstrap::new();

        assert_eq!(bootstrap.ensure_ready(&engine).await, Ok(BootstrapState::Ready));
        assert_eq!(bootstrap.ensure_ready(&engine).await, Ok(BootstrapState::Ready));
        assert_eq!(engine.initialize_calls(), 1);
        assert!(!bootstrap.is_initializing());
    }

    #[tokio::test]
    async fn test_failure_releases_flag() {
        let engine = DeterministicCipherEngine::new();
        engine.fail_initialize(true);
        let bootstrap = CipherBootstrap::new();

        assert!(bootstrap.ensure_ready(&engine).await.is_err());
        assert!(!bootstrap.is_initializing());

        engine.fail_initialize(false);
        assert_eq!(bootstrap.ensure_ready(&engine).await, Ok(BootstrapState::Ready));
    }

    #[tokio::test]
    async fn test_second_call_while_pending_is_noop() {
        let gate = Arc::new(Notify::new());
        let engine = Arc::new(DeterministicCipherEngine::new().with_init_gate(Arc::clone(&gate)));
        let bootstrap = Arc::new(CipherBootstrap::new());

        let first = {
            let engine = Arc::clone(&engine);
            let bootstrap = Arc::clone(&bootstrap);
            tokio::spawn(async move { bootstrap.ensure_ready(engine.as_ref()).await })
        };
        while !bootstrap.is_initializing() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            bootstrap.ensure_ready(engine.as_ref()).await,
            Ok(BootstrapState::Pending)
        );
        gate.notify_one();
        assert_eq!(first.await.unwrap(), Ok(BootstrapState::Ready));
        assert_eq!(engine.initialize_calls(), 1);
    }
}
