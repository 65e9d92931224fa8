use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pow::{PowError, ProofOfWork};
use super::transaction::Transaction;

/// A mined block in the commitment chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Timestamp when the block was assembled
    pub timestamp: DateTime<Utc>,

    /// Height in the chain, 0 for genesis
    pub height: u64,

    /// Hash of the parent block; empty only for genesis
    pub prev_hash: String,

    /// Transactions in insertion order; the order is part of the hash input
    pub transactions: Vec<Transaction>,

    /// Winning proof-of-work nonce
    pub nonce: u64,

    /// Block hash, produced by the proof-of-work search
    pub hash: String,
}

impl Block {
    /// Assembles a candidate and runs the proof-of-work search against it,
    /// fixing `nonce` and `hash` together from the mined values. This is the
    /// only path by which a block acquires a hash.
    pub fn create(
        transactions: Vec<Transaction>,
        prev_hash: String,
        height: u64,
        pow: &ProofOfWork,
    ) -> Result<Self, PowError> {
        let mut block = Block {
            timestamp: Utc::now(),
            height,
            prev_hash,
            transactions,
            nonce: 0,
            hash: String::new(),
        };

        let (nonce, hash) = pow.mine(&block)?;
        block.nonce = nonce;
        block.hash = hash;

        Ok(block)
    }

    /// Mines the genesis block: no transactions, empty parent hash, height 0.
    pub fn genesis(pow: &ProofOfWork) -> Result<Self, PowError> {
        Block::create(Vec::new(), String::new(), 0, pow)
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_empty()
    }
}
