//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports.

mod memory_ledger;
mod stub_cipher;

pub use memory_ledger::{InMemoryLedger, MemorySigner};
pub use stub_cipher::DeterministicCipherEngine;
