// Ledger engine
//
// Core of the append-only compute-commitment chain:
// - Canonical hashing and serialization
// - Transaction and block model
// - Proof-of-work admission gate
// - Durable hash-chained store with a backward parser
// - Collaborator traits for the content store and compute executor

pub mod block;
pub mod chain;
pub mod compute;
pub mod hashing;
pub mod parser;
pub mod pow;
pub mod store;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Ledger, LedgerConfig, LedgerError};
pub use compute::{ComputeError, ComputeExecutor, ContentStore};
pub use parser::ChainParser;
pub use pow::{PowError, ProofOfWork, DEFAULT_DIFFICULTY};
pub use store::{LedgerStore, StorageError};
pub use transaction::Transaction;
