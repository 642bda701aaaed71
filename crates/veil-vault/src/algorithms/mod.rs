//! # Algorithms Module
//!
//! Pure functions used by the coordinators.

pub mod clear_values;
pub mod record_id;
pub mod record_mapping;
pub mod stats;

pub use clear_values::{decode_clear_values, encode_clear_values, WORD_SIZE};
pub use record_id::{generate_record_id, record_id_from_parts};
pub use record_mapping::map_ledger_record;
pub use stats::compute_stats;
