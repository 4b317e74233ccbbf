use crate::compact::{CompactTarget, TargetError};
use crate::primitives::{
    BlockHash, BlockNonce, BlockTime, BlockVersion, Hash256, MerkleRoot, Target, ToHeaderBytes,
};
use sha2::{Digest, Sha256};

pub mod stored;

// -------------------------------------------------------------------------- //
// Block Header

/// A block header as handed over by the surrounding engine.
///
/// Headers are immutable values. The validator only looks at the creation
/// time, the declared target and the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: BlockVersion,
    pub prev_block_hash: BlockHash,
    pub merkle_root: MerkleRoot,
    pub time: BlockTime,
    pub bits: CompactTarget,
    pub nonce: BlockNonce,
}

impl BlockHeader {
    /// The declared target in expanded form.
    pub fn target(&self) -> Result<Target, TargetError> {
        self.bits.to_target()
    }

    /// Double SHA-256 over the 80 byte consensus layout of the header.
    pub fn hash(&self) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_header_bytes());
        hasher.update(self.prev_block_hash.to_header_bytes());
        hasher.update(self.merkle_root.to_header_bytes());
        hasher.update(self.time.to_header_bytes());
        hasher.update(self.bits.0.to_header_bytes());
        hasher.update(self.nonce.to_header_bytes());
        let first = hasher.finalize();
        let second = Sha256::digest(first);
        BlockHash(Hash256(second.into()))
    }
}
