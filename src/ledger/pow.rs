use primitive_types::U256;
use thiserror::Error;

use super::block::Block;
use super::hashing;

/// Default puzzle difficulty in bits of leading zeros.
pub const DEFAULT_DIFFICULTY: u32 = 7;

/// Errors that can occur during the proof-of-work search
#[derive(Debug, Error)]
pub enum PowError {
    #[error("Nonce space exhausted at difficulty {difficulty}")]
    NonceSpaceExhausted { difficulty: u32 },
}

/// Admission gate for candidate blocks: a block hash, read as an unsigned
/// big-endian 256-bit integer, must fall strictly below `1 << (256 - difficulty)`.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    difficulty: u32,
    target: U256,
}

impl ProofOfWork {
    /// Creates a gate for the given bit difficulty.
    ///
    /// # Panics
    ///
    /// Panics unless `difficulty` is in `1..=255`; a 256-bit shift has no
    /// representable target.
    pub fn new(difficulty: u32) -> Self {
        assert!(
            (1..256).contains(&difficulty),
            "difficulty must be in 1..=255, got {difficulty}"
        );
        let target = U256::one() << (256 - difficulty as usize);
        ProofOfWork { difficulty, target }
    }

    /// Hash preimage for a candidate: the transaction encodings in block
    /// order, the parent hash, the nonce, and the difficulty itself.
    fn merge_data(&self, block: &Block, nonce: u64) -> Vec<u8> {
        let mut data = Vec::new();
        for tx in &block.transactions {
            data.extend_from_slice(&tx.to_bytes());
        }
        data.extend_from_slice(block.prev_hash.as_bytes());
        data.extend_from_slice(&nonce.to_be_bytes());
        data.extend_from_slice(&u64::from(self.difficulty).to_be_bytes());
        data
    }

    fn meets_target(&self, digest: &[u8; 32]) -> bool {
        U256::from_big_endian(digest) < self.target
    }

    /// Sequential nonce search from zero; returns the first `(nonce, hash)`
    /// whose digest falls below the target. Single-threaded: this gates
    /// admission for one authoring node, it is not a competitive miner.
    pub fn mine(&self, block: &Block) -> Result<(u64, String), PowError> {
        for nonce in 0..u64::MAX {
            let digest = hashing::digest_bytes(&self.merge_data(block, nonce));
            if self.meets_target(&digest) {
                return Ok((nonce, hex::encode(digest)));
            }
        }
        Err(PowError::NonceSpaceExhausted {
            difficulty: self.difficulty,
        })
    }

    /// Recomputes the digest with the block's stored nonce and checks it
    /// against the target. Used as the post-mine self-check and by readers
    /// auditing stored blocks.
    pub fn is_valid(&self, block: &Block) -> bool {
        let digest = hashing::digest_bytes(&self.merge_data(block, block.nonce));
        self.meets_target(&digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transaction::Transaction;

    fn pow() -> ProofOfWork {
        ProofOfWork::new(4)
    }

    #[test]
    fn test_mined_block_is_valid() {
        let transactions = vec![Transaction::new("a", "ah", "i", "ih", "oh")];
        let block = Block::create(transactions, "parent".to_string(), 1, &pow()).unwrap();

        assert!(pow().is_valid(&block));
    }

    #[test]
    fn test_mined_hash_below_target() {
        let block = Block::create(Vec::new(), String::new(), 0, &pow()).unwrap();

        let digest = hex::decode(&block.hash).unwrap();
        let value = U256::from_big_endian(&digest);
        assert!(value < U256::one() << 252);
    }

    #[test]
    fn test_mining_is_deterministic() {
        let block = Block::create(Vec::new(), "parent".to_string(), 3, &pow()).unwrap();

        let (nonce, hash) = pow().mine(&block).unwrap();
        assert_eq!(nonce, block.nonce);
        assert_eq!(hash, block.hash);
    }

    #[test]
    fn test_nonce_below_winner_is_invalid() {
        let block = Block::create(Vec::new(), "parent".to_string(), 3, &pow()).unwrap();
        // mine() returns the first winning nonce, so every smaller one loses
        for nonce in 0..block.nonce {
            let mut candidate = block.clone();
            candidate.nonce = nonce;
            assert!(!pow().is_valid(&candidate));
        }
    }

    #[test]
    #[should_panic(expected = "difficulty must be in 1..=255")]
    fn test_rejects_zero_difficulty() {
        ProofOfWork::new(0);
    }
}
