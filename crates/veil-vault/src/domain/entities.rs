//! # Domain Entities
//!
//! Records as the ledger reports them and as the client caches them, plus
//! the session-level activity and notice types.

use serde::{Deserialize, Serialize};

use super::errors::VaultError;
use super::invariants::{category_index, PROGRESS_WINDOW_DAYS};
use super::value_objects::{Category, EncryptedPayload, Principal, RecordId};

/// Record fields as returned by the ledger's record fetch.
///
/// Numeric fields are optional because the remote store may omit them or
/// return values that are not numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Display label.
    pub name: String,
    /// Public field 1 (frequency).
    pub public_value1: Option<i64>,
    /// Public field 2 (category code).
    pub public_value2: Option<i64>,
    /// Last confirmed clear value of the encrypted field.
    pub decrypted_value: Option<i64>,
    /// Creation time assigned by the ledger (unix seconds).
    pub timestamp: u64,
    /// Creator account.
    pub creator: Principal,
    /// Whether the encrypted field has been revealed and confirmed.
    pub is_verified: bool,
}

/// A tracked record in the local schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record id.
    pub id: RecordId,
    /// Display label.
    pub name: String,
    /// Positive frequency.
    pub frequency: u32,
    /// Mirror of the last confirmed clear value; 0 until revealed.
    pub streak_public: u64,
    /// Raw public field the category is derived from.
    pub category_code: Option<i64>,
    /// Creation time assigned by the ledger (unix seconds).
    pub created_at: u64,
    /// Creator account.
    pub creator: Principal,
    /// Whether the encrypted field has been revealed and confirmed.
    pub verified: bool,
}

impl Record {
    /// Index into the category set.
    pub fn category_index(&self) -> usize {
        category_index(self.category_code)
    }

    /// Category derived from the public field.
    pub fn category(&self) -> Category {
        Category::from_code(self.category_code)
    }

    /// Progress over the 30-day window, as a percentage capped at 100.
    pub fn monthly_progress(&self) -> f64 {
        (self.streak_public as f64 / PROGRESS_WINDOW_DAYS as f64 * 100.0).min(100.0)
    }
}

/// Creation form input. Also the session's draft between edits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDraft {
    /// Display label; must not be blank.
    pub name: String,
    /// Public frequency.
    pub frequency: u32,
    /// Category, submitted as its index.
    pub category: Category,
    /// Initial streak; the only field submitted encrypted.
    pub streak_seed: u64,
}

impl Default for HabitDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            frequency: 1,
            category: Category::Health,
            streak_seed: 0,
        }
    }
}

impl HabitDraft {
    /// Draft with a name and defaults for everything else.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Creation call sent through the signer-capable ledger client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRecordRequest {
    /// Client-assigned id.
    pub id: RecordId,
    /// Display label.
    pub name: String,
    /// Encrypted streak seed and its proof.
    pub payload: EncryptedPayload,
    /// Public frequency.
    pub frequency: u32,
    /// Category index.
    pub category_index: u8,
    /// Free-text note.
    pub note: String,
}

/// Activity payload, one shape per action tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    /// A refresh completed.
    DataLoaded {
        /// Records in the rebuilt cache.
        count: usize,
    },
    /// The availability probe succeeded.
    ContractTest {
        /// Probe result label.
        result: String,
    },
    /// A record was created and confirmed.
    HabitCreated {
        /// Record name.
        name: String,
        /// Seed value that was encrypted.
        streak: u64,
    },
    /// A record's encrypted field was revealed.
    DataDecrypted {
        /// Record id.
        habit_id: RecordId,
        /// Revealed clear value.
        value: u64,
    },
}

impl ActivityAction {
    /// Action tag.
    pub fn tag(&self) -> &'static str {
        match self {
            ActivityAction::DataLoaded { .. } => "DATA_LOADED",
            ActivityAction::ContractTest { .. } => "CONTRACT_TEST",
            ActivityAction::HabitCreated { .. } => "HABIT_CREATED",
            ActivityAction::DataDecrypted { .. } => "DATA_DECRYPTED",
        }
    }
}

/// One entry of the activity log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Unix milliseconds.
    pub timestamp: u64,
    /// Tagged payload.
    #[serde(flatten)]
    pub action: ActivityAction,
    /// Principal connected when the entry was recorded.
    pub principal: Option<Principal>,
}

/// Phase of a status notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticePhase {
    /// Operation underway.
    Pending,
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
}

/// User-facing transient status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotice {
    /// Whether a notice is showing.
    pub visible: bool,
    /// Phase of the notice.
    pub phase: NoticePhase,
    /// Message text.
    pub message: String,
}

impl StatusNotice {
    /// The cleared state.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            phase: NoticePhase::Pending,
            message: String::new(),
        }
    }
}

/// Summary figures over the cached records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordStats {
    /// Number of records.
    pub total: usize,
    /// Records with a positive streak.
    pub completed: usize,
    /// Highest streak among records.
    pub best_streak: u64,
    /// `completed / total` as a rounded percentage.
    pub success_rate: u32,
    /// `completed / 7` as a rounded percentage capped at 100.
    pub weekly_progress: u32,
}

/// Result of a full refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records in ledger enumeration order; now the cache contents.
    pub records: Vec<Record>,
    /// Fetch failures of the records left out, as `VaultError::RecordFetch`.
    pub skipped: Vec<VaultError>,
    /// Whether the availability probe reported the ledger available.
    pub available: bool,
}

impl SyncReport {
    /// Ids of the records left out.
    pub fn skipped_ids(&self) -> Vec<RecordId> {
        self.skipped
            .iter()
            .filter_map(VaultError::skipped_record)
            .cloned()
            .collect()
    }
}

/// Terminal state of a successful reveal attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The record was already verified; the stored value, no proof submitted.
    AlreadyVerified(u64),
    /// The proof was relayed and confirmed; the revealed value.
    Revealed(u64),
    /// Another reveal confirmed the record first; refreshed, no value returned.
    ConcurrentlyVerified,
}

impl RevealOutcome {
    /// Clear value for the caller, if this path yields one.
    pub fn clear_value(&self) -> Option<u64> {
        match self {
            RevealOutcome::AlreadyVerified(v) | RevealOutcome::Revealed(v) => Some(*v),
            RevealOutcome::ConcurrentlyVerified => None,
        }
    }
}
