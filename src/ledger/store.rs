use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};
use thiserror::Error;

use super::block::Block;
use super::hashing;

/// Reserved metadata key holding the current tip hash
const TIP_KEY: &[u8] = b"tip";

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Block not found: {0}")]
    NotFound(String),

    #[error("Tip pointer missing; store is uninitialized or corrupted")]
    MissingTip,
}

/// Durable content-addressed block store with a single mutable tip pointer.
/// Blocks live in the `blocks` tree keyed by their own hash; the `metadata`
/// tree holds the reserved tip key.
pub struct LedgerStore {
    db: Db,
    blocks: Tree,
    metadata: Tree,
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore").finish()
    }
}

impl LedgerStore {
    /// Opens (or creates) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;

        let blocks = db.open_tree("blocks")?;
        let metadata = db.open_tree("metadata")?;

        Ok(Self {
            db,
            blocks,
            metadata,
        })
    }

    fn decode_block(bytes: &[u8]) -> Result<Block, StorageError> {
        bincode::deserialize(bytes).map_err(|e| StorageError::Deserialization(e.to_string()))
    }

    /// Point lookup by block hash.
    pub fn get_block(&self, hash: &str) -> Result<Block, StorageError> {
        match self.blocks.get(hash.as_bytes())? {
            Some(value) => Self::decode_block(&value),
            None => Err(StorageError::NotFound(hash.to_string())),
        }
    }

    pub fn contains(&self, hash: &str) -> Result<bool, StorageError> {
        Ok(self.blocks.contains_key(hash.as_bytes())?)
    }

    /// Current tip hash, or `None` on a store that has never been bootstrapped.
    pub fn tip_hash(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .metadata
            .get(TIP_KEY)?
            .map(|v| String::from_utf8_lossy(&v).to_string()))
    }

    /// Stores the genesis block and points the tip at it, in one transaction.
    pub fn bootstrap(&self, genesis: &Block) -> Result<(), StorageError> {
        let value = hashing::canonical_bytes(genesis);

        (&self.blocks, &self.metadata)
            .transaction(|(blocks, metadata)| {
                blocks.insert(genesis.hash.as_bytes(), value.clone())?;
                metadata.insert(TIP_KEY, genesis.hash.as_bytes())?;
                Ok(())
            })
            .map_err(flatten)?;

        self.db.flush()?;
        Ok(())
    }

    /// Appends a block. Idempotent: a hash already in storage is a no-op.
    /// The tip advances only when the new block is strictly higher than the
    /// block it currently points at; ties and lower heights are stored
    /// without moving it. Block insert and tip advance commit atomically, so
    /// a reader never observes a tip referencing an unstored block.
    pub fn append(&self, block: &Block) -> Result<(), StorageError> {
        let value = hashing::canonical_bytes(block);

        (&self.blocks, &self.metadata)
            .transaction(|(blocks, metadata)| {
                if blocks.get(block.hash.as_bytes())?.is_some() {
                    return Ok(());
                }

                blocks.insert(block.hash.as_bytes(), value.clone())?;

                let tip = metadata
                    .get(TIP_KEY)?
                    .ok_or(ConflictableTransactionError::Abort(StorageError::MissingTip))?;
                let tip_bytes = blocks.get(&tip)?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(StorageError::NotFound(
                        String::from_utf8_lossy(&tip).to_string(),
                    ))
                })?;
                let tip_block =
                    Self::decode_block(&tip_bytes).map_err(ConflictableTransactionError::Abort)?;

                if block.height > tip_block.height {
                    metadata.insert(TIP_KEY, block.hash.as_bytes())?;
                }

                Ok(())
            })
            .map_err(flatten)?;

        self.db.flush()?;
        Ok(())
    }
}

fn flatten(err: TransactionError<StorageError>) -> StorageError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => StorageError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::pow::ProofOfWork;
    use crate::ledger::transaction::Transaction;

    fn pow() -> ProofOfWork {
        ProofOfWork::new(4)
    }

    fn open_store() -> (tempfile::TempDir, LedgerStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn bootstrapped() -> (tempfile::TempDir, LedgerStore, Block) {
        let (dir, store) = open_store();
        let genesis = Block::genesis(&pow()).unwrap();
        store.bootstrap(&genesis).unwrap();
        (dir, store, genesis)
    }

    #[test]
    fn test_bootstrap_sets_tip() {
        let (_dir, store, genesis) = bootstrapped();

        assert_eq!(store.tip_hash().unwrap(), Some(genesis.hash.clone()));
        assert_eq!(store.get_block(&genesis.hash).unwrap(), genesis);
    }

    #[test]
    fn test_get_block_not_found() {
        let (_dir, store, _genesis) = bootstrapped();

        let err = store.get_block("missing").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_append_advances_tip() {
        let (_dir, store, genesis) = bootstrapped();

        let block = Block::create(
            vec![Transaction::new("a", "ah", "i", "ih", "oh")],
            genesis.hash.clone(),
            1,
            &pow(),
        )
        .unwrap();
        store.append(&block).unwrap();

        assert_eq!(store.tip_hash().unwrap(), Some(block.hash.clone()));
        assert_eq!(store.get_block(&block.hash).unwrap(), block);
    }

    #[test]
    fn test_append_is_idempotent() {
        let (_dir, store, genesis) = bootstrapped();

        let block = Block::create(Vec::new(), genesis.hash.clone(), 1, &pow()).unwrap();
        store.append(&block).unwrap();
        store.append(&block).unwrap();

        assert_eq!(store.tip_hash().unwrap(), Some(block.hash.clone()));
        assert_eq!(store.get_block(&block.hash).unwrap(), block);
    }

    #[test]
    fn test_lower_height_does_not_move_tip() {
        let (_dir, store, genesis) = bootstrapped();

        let high = Block::create(Vec::new(), genesis.hash.clone(), 5, &pow()).unwrap();
        let low = Block::create(Vec::new(), "elsewhere".to_string(), 3, &pow()).unwrap();

        store.append(&high).unwrap();
        store.append(&low).unwrap();

        // the lower block is stored but the tip stays on the higher one
        assert_eq!(store.tip_hash().unwrap(), Some(high.hash.clone()));
        assert!(store.contains(&low.hash).unwrap());
    }

    #[test]
    fn test_reopen_preserves_state() {
        let dir = tempfile::tempdir().unwrap();
        let genesis = Block::genesis(&pow()).unwrap();

        {
            let store = LedgerStore::open(dir.path()).unwrap();
            store.bootstrap(&genesis).unwrap();
        }

        let store = LedgerStore::open(dir.path()).unwrap();
        assert_eq!(store.tip_hash().unwrap(), Some(genesis.hash.clone()));
        assert_eq!(store.get_block(&genesis.hash).unwrap(), genesis);
    }
}
