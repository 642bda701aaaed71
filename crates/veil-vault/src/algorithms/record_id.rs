//! # Record Id Generation
//!
//! `<prefix>-<unix millis>-<9 base-36 chars>`: the timestamp orders ids
//! within a session and the random suffix separates ids minted in the same
//! millisecond.

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::RecordId;

const SUFFIX_LEN: usize = 9;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a fresh record id.
pub fn generate_record_id(prefix: &str) -> RecordId {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    record_id_from_parts(prefix, millis, &mut rand::thread_rng())
}

/// Build a record id from an explicit clock reading and random source.
pub fn record_id_from_parts<R: Rng>(prefix: &str, millis: u64, rng: &mut R) -> RecordId {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    RecordId::new(format!("{prefix}-{millis}-{suffix}"))
}
