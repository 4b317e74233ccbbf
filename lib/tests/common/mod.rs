#![allow(dead_code)]

use pow_retarget::primitives::{BlockHash, BlockNonce, BlockTime, BlockVersion, Hash256, MerkleRoot};
use pow_retarget::{BlockHeader, BlockStore, ChainParams, CompactTarget, MemoryBlockStore, RetargetPolicy, StoredBlock};

pub const MAX_BITS: u32 = 0x1e0fffff;
pub const HARD_BITS: u32 = 0x1d0fffff;
pub const HARDER_BITS: u32 = 0x1d00ffff;

pub const SPACING: u32 = 60;
pub const INTERVAL: u32 = 720;
pub const GENESIS_TIME: u32 = 1_493_596_800;

pub fn header(prev: BlockHash, time: u32, bits: u32) -> BlockHeader {
    BlockHeader {
        version: BlockVersion(1),
        prev_block_hash: prev,
        merkle_root: MerkleRoot(Hash256([0x11; 32])),
        time: BlockTime(time),
        bits: CompactTarget(bits),
        nonce: BlockNonce(0),
    }
}

/// A chain held in a memory store, together with the stored blocks in height
/// order.
pub struct TestChain {
    pub store: MemoryBlockStore,
    pub blocks: Vec<StoredBlock>,
}

impl TestChain {
    pub fn new(genesis_bits: u32) -> Self {
        let genesis = StoredBlock::genesis(header(BlockHash::ZERO, GENESIS_TIME, genesis_bits))
            .expect("genesis bits");
        let mut store = MemoryBlockStore::new();
        store.put(genesis.clone()).expect("memory store");
        TestChain {
            store,
            blocks: vec![genesis],
        }
    }

    pub fn params(&self, policy: RetargetPolicy) -> ChainParams {
        ChainParams::new(
            SPACING,
            SPACING * INTERVAL,
            CompactTarget(MAX_BITS),
            policy,
            self.genesis().header().hash(),
        )
        .expect("valid params")
    }

    pub fn genesis(&self) -> &StoredBlock {
        &self.blocks[0]
    }

    pub fn tip(&self) -> &StoredBlock {
        self.blocks.last().expect("genesis is always present")
    }

    pub fn push_at(&mut self, time: u32, bits: u32) -> &StoredBlock {
        let next = self
            .tip()
            .build(header(self.tip().header().hash(), time, bits))
            .expect("valid bits");
        self.store.put(next.clone()).expect("memory store");
        self.blocks.push(next);
        self.tip()
    }

    pub fn push(&mut self, bits: u32) -> &StoredBlock {
        let time = self.tip().header().time.0 + SPACING;
        self.push_at(time, bits)
    }

    /// Extend the chain until the tip is at `height`.
    pub fn extend_to(&mut self, height: u64, bits: u32) {
        while self.tip().height().0 < height {
            self.push(bits);
        }
    }

    /// A candidate on top of the tip, `delta` seconds after it.
    pub fn candidate(&self, delta: i64, bits: u32) -> BlockHeader {
        let time = i64::from(self.tip().header().time.0) + delta;
        header(self.tip().header().hash(), time as u32, bits)
    }
}
