use super::BlockHeader;
use crate::compact::TargetError;
use crate::primitives::{BlockHeight, Work};
use crate::store::{BlockStore, Error as StoreError};
use getset::{CopyGetters, Getters};

// -------------------------------------------------------------------------- //
// Stored Block

/// A header that has been accepted into the chain, annotated with its height
/// and the total work of the chain ending at it.
///
/// The parent is not owned. It is looked up by hash in a [`BlockStore`].
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct StoredBlock {
    #[getset(get = "pub")]
    header: BlockHeader,
    #[getset(get_copy = "pub")]
    height: BlockHeight,
    #[getset(get_copy = "pub")]
    chain_work: Work,
}

impl StoredBlock {
    pub fn genesis(header: BlockHeader) -> Result<Self, TargetError> {
        let chain_work = header.target()?.work();
        Ok(StoredBlock {
            header,
            height: BlockHeight(0),
            chain_work,
        })
    }

    /// Link a header on top of this block.
    pub fn build(&self, header: BlockHeader) -> Result<Self, TargetError> {
        let chain_work = self.chain_work.saturating_add(header.target()?.work());
        Ok(StoredBlock {
            header,
            height: self.height.succ(),
            chain_work,
        })
    }

    /// Resolve the parent of this block.
    ///
    /// Fails if the store does not know the parent or returns a block that is
    /// not exactly one below this one.
    pub fn prev<S>(&self, store: &S) -> Result<StoredBlock, StoreError>
    where
        S: BlockStore + ?Sized,
    {
        let parent_hash = self.header.prev_block_hash;
        let parent = store.get(&parent_hash)?;
        if self.height.0 == 0 || parent.height != self.height.pred() {
            return Err(StoreError::BrokenLink {
                hash: parent_hash,
                height: parent.height,
                child_height: self.height,
            });
        }
        Ok(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::CompactTarget;
    use crate::primitives::{BlockHash, BlockNonce, BlockTime, BlockVersion, Hash256, MerkleRoot};
    use crate::store::memory::MemoryBlockStore;

    fn header(prev: BlockHash, time: u32) -> BlockHeader {
        BlockHeader {
            version: BlockVersion(1),
            prev_block_hash: prev,
            merkle_root: MerkleRoot(Hash256([1; 32])),
            time: BlockTime(time),
            bits: CompactTarget(0x1e0fffff),
            nonce: BlockNonce(0),
        }
    }

    #[test]
    fn build_increments_height_and_work() {
        let genesis = StoredBlock::genesis(header(BlockHash::ZERO, 0)).unwrap();
        let child = genesis.build(header(genesis.header().hash(), 60)).unwrap();
        assert_eq!(genesis.height(), BlockHeight(0));
        assert_eq!(child.height(), BlockHeight(1));
        assert!(child.chain_work() > genesis.chain_work());
    }

    #[test]
    fn build_rejects_malformed_bits() {
        let genesis = StoredBlock::genesis(header(BlockHash::ZERO, 0)).unwrap();
        let mut bad = header(genesis.header().hash(), 60);
        bad.bits = CompactTarget(0x04923456);
        assert!(genesis.build(bad).is_err());
    }

    #[test]
    fn zero_target_links_with_saturated_work() {
        let mut zero = header(BlockHash::ZERO, 0);
        zero.bits = CompactTarget(0x01003456);
        let genesis = StoredBlock::genesis(zero).unwrap();
        assert_eq!(genesis.chain_work(), Work(ethnum::u256::MAX));

        let mut next = header(genesis.header().hash(), 60);
        next.bits = CompactTarget(0);
        let child = genesis.build(next).unwrap();
        assert_eq!(child.chain_work(), Work(ethnum::u256::MAX));
        assert_eq!(child.height(), BlockHeight(1));
    }

    #[test]
    fn prev_resolves_through_store() {
        let mut store = MemoryBlockStore::new();
        let genesis = StoredBlock::genesis(header(BlockHash::ZERO, 0)).unwrap();
        let child = genesis.build(header(genesis.header().hash(), 60)).unwrap();
        store.put(genesis.clone()).unwrap();
        store.put(child.clone()).unwrap();

        assert_eq!(child.prev(&store).unwrap(), genesis);
        assert!(matches!(
            genesis.prev(&store),
            Err(StoreError::BlockNotFound(hash)) if hash == BlockHash::ZERO
        ));
    }

    #[test]
    fn prev_detects_height_mismatch() {
        let mut store = MemoryBlockStore::new();
        let genesis = StoredBlock::genesis(header(BlockHash::ZERO, 0)).unwrap();
        let child = genesis.build(header(genesis.header().hash(), 60)).unwrap();
        let grandchild = child.build(header(genesis.header().hash(), 120)).unwrap();
        store.put(genesis).unwrap();

        assert!(matches!(
            grandchild.prev(&store),
            Err(StoreError::BrokenLink { child_height: BlockHeight(2), .. })
        ));
    }
}
