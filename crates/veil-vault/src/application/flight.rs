//! # Single-Flight Guards
//!
//! One flag per operation kind. `try_begin` either claims the flag and
//! returns a guard that releases it on drop, or rejects the call.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::{OperationKind, VaultError};

/// In-progress flag for one operation kind.
#[derive(Debug)]
pub struct FlightFlag {
    kind: OperationKind,
    active: AtomicBool,
}

impl FlightFlag {
    /// Create an idle flag.
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            active: AtomicBool::new(false),
        }
    }

    /// Claim the flag.
    ///
    /// # Errors
    /// - `OperationInProgress` if an operation of this kind is already in flight
    pub fn try_begin(&self) -> Result<FlightGuard<'_>, VaultError> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| FlightGuard { flag: self })
            .map_err(|_| VaultError::OperationInProgress(self.kind))
    }

    /// Whether an operation of this kind is in flight.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Operation kind this flag guards.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

/// Claim on a [`FlightFlag`]; releases it when dropped.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flag: &'a FlightFlag,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.active.store(false, Ordering::Release);
    }
}
