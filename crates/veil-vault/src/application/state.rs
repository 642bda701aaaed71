//! # Session State
//!
//! Explicit state of one vault session: the record cache, activity log,
//! status notice, connection and creation draft. Coordinators hold an
//! `Arc<SessionState>` and go through these methods; no lock is held across
//! an await point.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

use super::activity::ActivityLog;
use super::status::StatusMachine;
use super::store::RecordStore;
use crate::config::VaultConfig;
use crate::domain::{
    ActivityAction, ContractAddress, HabitDraft, NoticePhase, Principal, VaultError,
};
use crate::ports::LedgerSigner;

/// Connected principal and the signer bound to it.
#[derive(Clone)]
pub struct Connection {
    /// Connected account.
    pub principal: Principal,
    /// Signer-capable ledger client for `principal`.
    pub signer: Arc<dyn LedgerSigner>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}

/// State shared by the coordinators of one session.
#[derive(Debug)]
pub struct SessionState {
    config: VaultConfig,
    records: RecordStore,
    activity: ActivityLog,
    status: StatusMachine,
    connection: RwLock<Option<Connection>>,
    target: RwLock<Option<ContractAddress>>,
    draft: Mutex<HabitDraft>,
}

impl SessionState {
    /// Create an empty, disconnected session.
    pub fn new(config: VaultConfig) -> Self {
        Self {
            records: RecordStore::new(),
            activity: ActivityLog::new(config.history_capacity),
            status: StatusMachine::new(config.clone()),
            connection: RwLock::new(None),
            target: RwLock::new(None),
            draft: Mutex::new(HabitDraft::default()),
            config,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Record cache.
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Activity log.
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Notice holder.
    pub fn status(&self) -> &StatusMachine {
        &self.status
    }

    /// Bind a principal and its signer.
    pub fn bind(&self, connection: Connection) {
        *self.connection.write() = Some(connection);
    }

    /// Drop the principal and signer.
    pub fn unbind(&self) -> Option<Connection> {
        self.connection.write().take()
    }

    /// Current connection, if any.
    pub fn connection(&self) -> Option<Connection> {
        self.connection.read().clone()
    }

    /// Connected principal, if any.
    pub fn principal(&self) -> Option<Principal> {
        self.connection.read().as_ref().map(|c| c.principal.clone())
    }

    /// Current connection, or the authentication error with its notice.
    pub fn require_connection(&self) -> Result<Connection, VaultError> {
        self.connection()
            .ok_or_else(|| self.fail(VaultError::AuthenticationRequired))
    }

    /// Ledger address used as encryption and reveal target.
    pub fn target(&self) -> Option<ContractAddress> {
        self.target.read().clone()
    }

    /// Record the ledger address.
    pub fn set_target(&self, target: ContractAddress) {
        *self.target.write() = Some(target);
    }

    /// Forget the ledger address.
    pub fn clear_target(&self) {
        *self.target.write() = None;
    }

    /// Current creation draft.
    pub fn draft(&self) -> HabitDraft {
        self.draft.lock().clone()
    }

    /// Replace the creation draft.
    pub fn set_draft(&self, draft: HabitDraft) {
        *self.draft.lock() = draft;
    }

    /// Reset the creation draft to its defaults.
    pub fn reset_draft(&self) {
        *self.draft.lock() = HabitDraft::default();
    }

    /// Append an activity entry attributed to the connected principal.
    pub fn log(&self, action: ActivityAction) {
        self.activity.record(action, self.principal());
    }

    /// Show a notice.
    pub fn notify(&self, phase: NoticePhase, message: impl Into<String>) {
        self.status.notify(phase, message);
    }

    /// Show the error notice for `err` and hand it back.
    pub fn fail(&self, err: VaultError) -> VaultError {
        self.status.notify(NoticePhase::Error, err.user_message());
        err
    }
}
