//! # Record Mapping
//!
//! Ledger record fields to the local schema.

use crate::domain::{LedgerRecord, Record, RecordId, DEFAULT_FREQUENCY};

/// Map a fetched ledger record into the local schema.
///
/// - `frequency`: public field 1 when positive, else 1
/// - `streak_public`: confirmed clear value when verified, else 0
/// - `category_code`: public field 2, kept raw; the category is derived on read
pub fn map_ledger_record(id: RecordId, fields: LedgerRecord) -> Record {
    let frequency = fields
        .public_value1
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(DEFAULT_FREQUENCY);

    // Unverified records show the placeholder regardless of what the ledger holds.
    let streak_public = if fields.is_verified {
        fields
            .decrypted_value
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0)
    } else {
        0
    };

    Record {
        id,
        name: fields.name,
        frequency,
        streak_public,
        category_code: fields.public_value2,
        created_at: fields.timestamp,
        creator: fields.creator,
        verified: fields.is_verified,
    }
}
