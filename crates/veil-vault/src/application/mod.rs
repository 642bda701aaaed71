//! # Application Layer
//!
//! Session state and the coordinators built on it.

pub mod activity;
pub mod bootstrap;
pub mod creation;
pub mod flight;
pub mod reveal;
pub mod session;
pub mod state;
pub mod status;
pub mod store;
pub mod sync;

pub use activity::ActivityLog;
pub use bootstrap::{BootstrapState, CipherBootstrap};
pub use creation::CreationCoordinator;
pub use flight::{FlightFlag, FlightGuard};
pub use reveal::{LedgerRevealSubmitter, RevealCoordinator};
pub use session::VaultSession;
pub use state::{Connection, SessionState};
pub use status::{NoticeId, StatusMachine};
pub use store::RecordStore;
pub use sync::{SyncController, PROBE_AVAILABLE};
