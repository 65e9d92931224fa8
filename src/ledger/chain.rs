use std::path::PathBuf;

use log::info;
use thiserror::Error;

use super::block::Block;
use super::compute::ComputeExecutor;
use super::parser::ChainParser;
use super::pow::{PowError, ProofOfWork, DEFAULT_DIFFICULTY};
use super::store::{LedgerStore, StorageError};
use super::transaction::Transaction;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Proof of work error: {0}")]
    Pow(#[from] PowError),

    #[error("Invalid transaction: {id}")]
    InvalidTransaction { id: String },
}

/// Explicit ledger configuration; there is no process-wide state.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Directory holding the block database
    pub path: PathBuf,

    /// Proof-of-work difficulty in bits
    pub difficulty: u32,
}

impl LedgerConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LedgerConfig {
            path: path.into(),
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

/// The single-writer ledger: a durable hash-chained sequence of commitment blocks, gated
/// by proof-of-work. Single active writer; reads are consistent point-in-time
/// lookups against the store.
pub struct Ledger {
    store: LedgerStore,
    pow: ProofOfWork,
}

impl Ledger {
    /// Opens (or creates) the ledger. An empty store is bootstrapped with a
    /// freshly mined genesis block before the ledger is returned.
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let store = LedgerStore::open(&config.path)?;
        let pow = ProofOfWork::new(config.difficulty);

        if store.tip_hash()?.is_none() {
            info!("No existing chain found, mining genesis block");
            let genesis = Block::genesis(&pow)?;
            store.bootstrap(&genesis)?;
            info!("Genesis block {} stored", genesis.hash);
        }

        Ok(Ledger { store, pow })
    }

    fn tip_block(&self) -> Result<Block, LedgerError> {
        let tip = self.store.tip_hash()?.ok_or(StorageError::MissingTip)?;
        Ok(self.store.get_block(&tip)?)
    }

    /// Hash of the block the tip currently points at.
    pub fn tip_hash(&self) -> Result<String, LedgerError> {
        Ok(self.store.tip_hash()?.ok_or(StorageError::MissingTip)?)
    }

    /// Height of the block the tip currently points at.
    pub fn best_height(&self) -> Result<u64, LedgerError> {
        Ok(self.tip_block()?.height)
    }

    pub fn get_block(&self, hash: &str) -> Result<Block, LedgerError> {
        Ok(self.store.get_block(hash)?)
    }

    /// Verifies the whole batch against the compute executor, then mines the
    /// next block on the current tip and appends it. One failed verification
    /// aborts the batch; neither the tip nor storage changes.
    pub fn mine_block(
        &self,
        transactions: Vec<Transaction>,
        executor: &dyn ComputeExecutor,
    ) -> Result<Block, LedgerError> {
        for tx in &transactions {
            if !tx.verify(executor) {
                return Err(LedgerError::InvalidTransaction { id: tx.id.clone() });
            }
        }

        let tip = self.tip_block()?;

        // the nonce search is CPU-bound and runs outside any storage
        // transaction; only the final append commits transactionally
        let block = Block::create(transactions, tip.hash, tip.height + 1, &self.pow)?;
        self.append(&block)?;

        info!("Mined block {} at height {}", block.hash, block.height);
        Ok(block)
    }

    /// Stores a block and conditionally advances the tip; see
    /// [`LedgerStore::append`] for the exact semantics.
    pub fn append(&self, block: &Block) -> Result<(), LedgerError> {
        self.store.append(block)?;
        Ok(())
    }

    /// Recomputes the proof-of-work check for a stored block.
    pub fn audit_block(&self, block: &Block) -> bool {
        self.pow.is_valid(block)
    }

    /// Backward reader starting at the current tip. The reader holds no
    /// locks between steps; callers needing a stable snapshot should capture
    /// [`Ledger::tip_hash`] once and treat it as fixed.
    pub fn parser(&self) -> Result<ChainParser<'_>, LedgerError> {
        let tip = self.store.tip_hash()?.ok_or(StorageError::MissingTip)?;
        Ok(ChainParser::new(&self.store, tip))
    }

    /// Every block hash from tip back to genesis, inclusive.
    pub fn block_hashes(&self) -> Result<Vec<String>, LedgerError> {
        let mut hashes = Vec::new();
        for block in self.parser()? {
            hashes.push(block?.hash);
        }
        Ok(hashes)
    }
}
