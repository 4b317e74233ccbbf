use crate::header::stored::StoredBlock;
use crate::primitives::{BlockHash, BlockHeight};
use thiserror::Error;

pub mod memory;

#[derive(Debug, Error)]
pub enum Error {
    #[error("block {0} not found")]
    BlockNotFound(BlockHash),
    #[error("block {hash} at height {height} is not the parent of a block at height {child_height}")]
    BrokenLink {
        hash: BlockHash,
        height: BlockHeight,
        child_height: BlockHeight,
    },
    #[error("block store backend failure")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Read access to the accepted chain history, keyed by block hash.
///
/// Lookups only need `&self`, so a store that supports shared reads can serve
/// concurrent validations.
pub trait BlockStore {
    /// Fetch a stored block. Returns [`Error::BlockNotFound`] when the history
    /// is missing or pruned.
    fn get(&self, block_hash: &BlockHash) -> Result<StoredBlock, Error>;

    /// Write a block to the store. Writing a block twice is a no-op.
    fn put(&mut self, block: StoredBlock) -> Result<(), Error>;

    /// Check whether a block exists.
    fn block_exists(&self, block_hash: &BlockHash) -> Result<bool, Error> {
        match self.get(block_hash) {
            Ok(_) => Ok(true),
            Err(Error::BlockNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl<T: ?Sized + BlockStore> BlockStore for Box<T> {
    fn get(&self, block_hash: &BlockHash) -> Result<StoredBlock, Error> {
        (**self).get(block_hash)
    }

    fn put(&mut self, block: StoredBlock) -> Result<(), Error> {
        (**self).put(block)
    }

    fn block_exists(&self, block_hash: &BlockHash) -> Result<bool, Error> {
        (**self).block_exists(block_hash)
    }
}
