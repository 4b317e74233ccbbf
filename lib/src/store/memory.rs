use super::{BlockStore, Error};
use crate::header::stored::StoredBlock;
use crate::primitives::BlockHash;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: HashMap<BlockHash, StoredBlock>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        MemoryBlockStore {
            blocks: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop a block, as a pruning store would.
    pub fn remove(&mut self, block_hash: &BlockHash) -> Option<StoredBlock> {
        self.blocks.remove(block_hash)
    }
}

impl BlockStore for MemoryBlockStore {
    fn get(&self, block_hash: &BlockHash) -> Result<StoredBlock, Error> {
        match self.blocks.get(block_hash) {
            None => Err(Error::BlockNotFound(*block_hash)),
            Some(block) => Ok(block.clone()),
        }
    }

    fn put(&mut self, block: StoredBlock) -> Result<(), Error> {
        self.blocks
            .entry(block.header().hash())
            .or_insert(block);
        Ok(())
    }
}
