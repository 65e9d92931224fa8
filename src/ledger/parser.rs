use super::block::Block;
use super::store::{LedgerStore, StorageError};

/// Lazy backward walk over the chain, from a fixed tip down to genesis.
/// One-shot: once the genesis block has been yielded the parser is finished,
/// and a fresh one must be created to traverse again. A hash that cannot be
/// resolved means the store is corrupted or truncated; the parser yields the
/// error and stops rather than skipping the gap.
pub struct ChainParser<'a> {
    store: &'a LedgerStore,
    current_hash: String,
    finished: bool,
}

impl<'a> ChainParser<'a> {
    pub(crate) fn new(store: &'a LedgerStore, tip_hash: String) -> Self {
        ChainParser {
            store,
            current_hash: tip_hash,
            finished: false,
        }
    }
}

impl Iterator for ChainParser<'_> {
    type Item = Result<Block, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.store.get_block(&self.current_hash) {
            Ok(block) => {
                if block.is_genesis() {
                    self.finished = true;
                } else {
                    self.current_hash = block.prev_hash.clone();
                }
                Some(Ok(block))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::pow::ProofOfWork;

    fn pow() -> ProofOfWork {
        ProofOfWork::new(4)
    }

    fn chain_of(length: u64) -> (tempfile::TempDir, LedgerStore, String) {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();

        let genesis = Block::genesis(&pow()).unwrap();
        store.bootstrap(&genesis).unwrap();

        let mut tip = genesis.hash;
        for height in 1..=length {
            let block = Block::create(Vec::new(), tip, height, &pow()).unwrap();
            tip = block.hash.clone();
            store.append(&block).unwrap();
        }

        (dir, store, tip)
    }

    #[test]
    fn test_walk_terminates_at_genesis() {
        let (_dir, store, tip) = chain_of(3);

        let blocks: Vec<Block> = ChainParser::new(&store, tip)
            .collect::<Result<_, _>>()
            .unwrap();

        // tip height 3, so tip back to genesis is exactly 4 blocks
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].height, 3);
        assert!(blocks.last().unwrap().is_genesis());

        for pair in blocks.windows(2) {
            assert_eq!(pair[0].prev_hash, pair[1].hash);
            assert_eq!(pair[0].height, pair[1].height + 1);
        }
    }

    #[test]
    fn test_parser_is_one_shot() {
        let (_dir, store, tip) = chain_of(1);

        let mut parser = ChainParser::new(&store, tip);
        assert!(parser.next().is_some());
        assert!(parser.next().is_some());
        assert!(parser.next().is_none());
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_missing_ancestor_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();

        let genesis = Block::genesis(&pow()).unwrap();
        store.bootstrap(&genesis).unwrap();

        // orphan whose parent was never stored
        let orphan = Block::create(Vec::new(), "absent-parent".to_string(), 1, &pow()).unwrap();
        store.append(&orphan).unwrap();

        let mut parser = ChainParser::new(&store, orphan.hash);
        assert!(parser.next().unwrap().is_ok());
        assert!(matches!(
            parser.next().unwrap(),
            Err(StorageError::NotFound(_))
        ));
        assert!(parser.next().is_none());
    }
}
