//! # Clear-Value Encoding
//!
//! Clear values travel to the ledger's verification entry point as
//! consecutive 32-byte big-endian words, one per decrypted handle.

use crate::domain::{EncodedClearValues, LedgerError};

/// Size of one encoded word.
pub const WORD_SIZE: usize = 32;

/// Encode clear values in handle order.
pub fn encode_clear_values(values: &[u64]) -> EncodedClearValues {
    let mut bytes = Vec::with_capacity(values.len() * WORD_SIZE);
    for value in values {
        bytes.extend_from_slice(&[0u8; WORD_SIZE - 8]);
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    EncodedClearValues(bytes)
}

/// Decode clear values.
///
/// # Errors
/// - `InvalidClearValues` if the length is not a multiple of the word size
/// - `InvalidClearValues` if a word does not fit in a `u64`
pub fn decode_clear_values(encoded: &EncodedClearValues) -> Result<Vec<u64>, LedgerError> {
    let bytes = &encoded.0;
    if bytes.len() % WORD_SIZE != 0 {
        return Err(LedgerError::InvalidClearValues(format!(
            "length {} is not a multiple of {}",
            bytes.len(),
            WORD_SIZE
        )));
    }

    bytes
        .chunks_exact(WORD_SIZE)
        .map(|word| {
            let (high, low) = word.split_at(WORD_SIZE - 8);
            if high.iter().any(|b| *b != 0) {
                return Err(LedgerError::InvalidClearValues(
                    "value exceeds 64 bits".to_string(),
                ));
            }
            let mut buf = [0u8; 8];
            buf.copy_from_slice(low);
            Ok(u64::from_be_bytes(buf))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let encoded = encode_clear_values(&[42]);
        assert_eq!(encoded.0.len(), WORD_SIZE);
        assert_eq!(encoded.0[WORD_SIZE - 1], 42);
        assert!(encoded.0[..WORD_SIZE - 1].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_decode_multiple_words() {
        let encoded = encode_clear_values(&[1, u64::MAX, 0]);
        assert_eq!(decode_clear_values(&encoded).unwrap(), vec![1, u64::MAX, 0]);
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let result = decode_clear_values(&EncodedClearValues(vec![0u8; 31]));
        assert!(matches!(result, Err(LedgerError::InvalidClearValues(_))));
    }

    #[test]
    fn test_decode_rejects_oversized_word() {
        let mut word = vec![0u8; WORD_SIZE];
        word[0] = 1;
        let result = decode_clear_values(&EncodedClearValues(word));
        assert!(result.is_err());
    }
}
