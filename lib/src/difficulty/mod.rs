//! Admissibility of the difficulty target declared by a new block.

use crate::compact::{CompactTarget, TargetError};
use crate::header::stored::StoredBlock;
use crate::header::BlockHeader;
use crate::params::{ChainParams, RetargetPolicy};
use crate::primitives::BlockHeight;
use crate::store::{BlockStore, Error as StoreError};
use thiserror::Error;
use tracing::{debug, trace};

pub mod retarget;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("testnet block transition that is not allowed: {expected} vs {actual}")]
    DisallowedTransition {
        expected: CompactTarget,
        actual: CompactTarget,
    },
    #[error("unexpected change in difficulty at height {height}: {expected} vs {actual}")]
    UnexpectedDifficultyChange {
        height: BlockHeight,
        expected: CompactTarget,
        actual: CompactTarget,
    },
    #[error("network provided difficulty bits do not match what was calculated at height {height}: {expected} vs {actual}")]
    RetargetMismatch {
        height: BlockHeight,
        expected: CompactTarget,
        actual: CompactTarget,
    },
    #[error("malformed difficulty target")]
    MalformedTarget(#[from] TargetError),
    #[error("cannot read chain history")]
    Storage(#[from] StoreError),
}

// -------------------------------------------------------------------------- //
// Difficulty Transition Validator

/// Decides whether a block may declare its target at its height.
///
/// The validator keeps no state of its own; it can be shared between threads
/// and called concurrently as long as the block store allows shared reads.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyTransitionValidator<'a> {
    params: &'a ChainParams,
    policy: RetargetPolicy,
}

impl<'a> DifficultyTransitionValidator<'a> {
    pub fn new(params: &'a ChainParams) -> Self {
        DifficultyTransitionValidator {
            params,
            policy: params.retarget_policy(),
        }
    }

    pub fn policy(&self) -> RetargetPolicy {
        self.policy
    }

    /// Check the target of `next`, a candidate block on top of `prev`.
    pub fn validate<S>(
        &self,
        prev: &StoredBlock,
        next: &BlockHeader,
        store: &S,
    ) -> Result<(), ConsensusError>
    where
        S: BlockStore + ?Sized,
    {
        let height = prev.height().succ();

        if self.params.is_retarget_height(height) {
            debug!(height = height.0, "retarget point");
            return retarget::check_retarget(self.params, prev, next, store);
        }

        match self.policy {
            RetargetPolicy::Standard => self.check_unchanged(prev, next),
            RetargetPolicy::PermissiveMinDifficulty => {
                self.check_min_difficulty_rule(prev, next, store)
            }
        }
    }

    /// Between retarget points the target is inherited from the parent.
    fn check_unchanged(&self, prev: &StoredBlock, next: &BlockHeader) -> Result<(), ConsensusError> {
        if prev.header().target()? != next.target()? {
            return Err(ConsensusError::UnexpectedDifficultyChange {
                height: prev.height().succ(),
                expected: prev.header().bits,
                actual: next.bits,
            });
        }
        Ok(())
    }

    /// Test network rule for blocks between retarget points.
    ///
    /// If the block arrives within twice the target spacing after its parent it
    /// must repeat the target of the last block that was not mined at the
    /// easiest target. Any other gap, including a negative one, leaves the
    /// target unconstrained. Negative gaps are accepted, as on the deployed
    /// network.
    fn check_min_difficulty_rule<S>(
        &self,
        prev: &StoredBlock,
        next: &BlockHeader,
        store: &S,
    ) -> Result<(), ConsensusError>
    where
        S: BlockStore + ?Sized,
    {
        let time_delta = next.time.seconds_since(prev.header().time);
        let max_gap = 2 * i64::from(self.params.target_spacing());

        if !(0..=max_gap).contains(&time_delta) {
            debug!(
                height = prev.height().succ().0,
                time_delta, "target unconstrained after gap"
            );
            return Ok(());
        }

        let cursor = self.last_non_min_difficulty(prev, store)?;
        let expected = cursor.header().target()?;
        if expected != next.target()? {
            debug!(
                height = prev.height().succ().0,
                time_delta,
                cursor = cursor.height().0,
                expected = %cursor.header().bits,
                actual = %next.bits,
                "disallowed testnet transition"
            );
            return Err(ConsensusError::DisallowedTransition {
                expected: cursor.header().bits,
                actual: next.bits,
            });
        }
        Ok(())
    }

    /// Walk back from `prev` over blocks mined at the easiest target.
    ///
    /// Stops at the genesis block, at a retarget height, or at the first block
    /// whose target is harder than the limit.
    fn last_non_min_difficulty<S>(
        &self,
        prev: &StoredBlock,
        store: &S,
    ) -> Result<StoredBlock, ConsensusError>
    where
        S: BlockStore + ?Sized,
    {
        let genesis = self.params.genesis_hash();
        let max_target = self.params.max_target_value();

        let mut cursor = prev.clone();
        while cursor.header().hash() != genesis
            && !self.params.is_retarget_height(cursor.height())
            && cursor.header().target()? == max_target
        {
            trace!(height = cursor.height().0, "skipping minimum difficulty block");
            cursor = cursor.prev(store)?;
        }
        Ok(cursor)
    }
}

/// Check the target of `next` against the rules selected by `params`.
pub fn check_difficulty_transition<S>(
    params: &ChainParams,
    prev: &StoredBlock,
    next: &BlockHeader,
    store: &S,
) -> Result<(), ConsensusError>
where
    S: BlockStore + ?Sized,
{
    DifficultyTransitionValidator::new(params).validate(prev, next, store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{BlockHash, BlockNonce, BlockTime, BlockVersion, Hash256, MerkleRoot};
    use crate::store::memory::MemoryBlockStore;

    const MAX: u32 = 0x1e0fffff;
    const HARD: u32 = 0x1d0fffff;

    fn params(policy: RetargetPolicy, genesis: &BlockHeader) -> ChainParams {
        ChainParams::new(60, 10 * 60, CompactTarget(MAX), policy, genesis.hash()).unwrap()
    }

    fn header(prev: BlockHash, time: u32, bits: u32) -> BlockHeader {
        BlockHeader {
            version: BlockVersion(1),
            prev_block_hash: prev,
            merkle_root: MerkleRoot(Hash256([0; 32])),
            time: BlockTime(time),
            bits: CompactTarget(bits),
            nonce: BlockNonce(0),
        }
    }

    /// Genesis plus one block per entry of `bits`, spaced 60 seconds apart.
    fn chain(bits: &[u32]) -> (MemoryBlockStore, Vec<StoredBlock>) {
        let mut store = MemoryBlockStore::new();
        let genesis = StoredBlock::genesis(header(BlockHash::ZERO, 1_000, HARD)).unwrap();
        store.put(genesis.clone()).unwrap();
        let mut blocks = vec![genesis];
        for &b in bits {
            let tip = blocks.last().unwrap();
            let time = tip.header().time.0 + 60;
            let next = tip.build(header(tip.header().hash(), time, b)).unwrap();
            store.put(next.clone()).unwrap();
            blocks.push(next);
        }
        (store, blocks)
    }

    #[test]
    fn validator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DifficultyTransitionValidator<'static>>();
    }

    #[test]
    fn policy_comes_from_params() {
        let (_, blocks) = chain(&[]);
        let p = params(RetargetPolicy::PermissiveMinDifficulty, blocks[0].header());
        assert_eq!(
            DifficultyTransitionValidator::new(&p).policy(),
            RetargetPolicy::PermissiveMinDifficulty
        );
    }

    #[test]
    fn standard_requires_same_target() {
        let (store, blocks) = chain(&[HARD, HARD]);
        let p = params(RetargetPolicy::Standard, blocks[0].header());
        let v = DifficultyTransitionValidator::new(&p);
        let tip = &blocks[2];

        let same = header(tip.header().hash(), 10_000, HARD);
        assert!(v.validate(tip, &same, &store).is_ok());

        let easier = header(tip.header().hash(), 10_000, MAX);
        assert!(matches!(
            v.validate(tip, &easier, &store),
            Err(ConsensusError::UnexpectedDifficultyChange { height: BlockHeight(3), .. })
        ));
    }

    #[test]
    fn standard_compares_expanded_targets() {
        // 0x1e000fff is a non-canonical encoding of 0x1d0fff00
        let (store, blocks) = chain(&[0x1d0fff00]);
        let p = params(RetargetPolicy::Standard, blocks[0].header());
        let tip = &blocks[1];

        let next = header(tip.header().hash(), 5_000, 0x1e000fff);
        assert_ne!(next.bits, tip.header().bits);
        assert!(check_difficulty_transition(&p, tip, &next, &store).is_ok());
    }

    #[test]
    fn short_gap_skips_min_difficulty_blocks() {
        let (store, blocks) = chain(&[HARD, MAX, MAX]);
        let p = params(RetargetPolicy::PermissiveMinDifficulty, blocks[0].header());
        let v = DifficultyTransitionValidator::new(&p);
        let tip = &blocks[3];
        let t = tip.header().time.0 + 30;

        assert!(v.validate(tip, &header(tip.header().hash(), t, HARD), &store).is_ok());
        assert!(matches!(
            v.validate(tip, &header(tip.header().hash(), t, MAX), &store),
            Err(ConsensusError::DisallowedTransition { expected, actual })
                if expected == CompactTarget(HARD) && actual == CompactTarget(MAX)
        ));
    }

    #[test]
    fn gap_boundaries() {
        let (store, blocks) = chain(&[HARD, MAX]);
        let p = params(RetargetPolicy::PermissiveMinDifficulty, blocks[0].header());
        let v = DifficultyTransitionValidator::new(&p);
        let tip = &blocks[2];
        let base = tip.header().time.0;

        // exactly twice the spacing is still a short gap
        let at_limit = header(tip.header().hash(), base + 120, MAX);
        assert!(v.validate(tip, &at_limit, &store).is_err());
        // same timestamp as the parent is a short gap too
        let zero = header(tip.header().hash(), base, MAX);
        assert!(v.validate(tip, &zero, &store).is_err());

        let past_limit = header(tip.header().hash(), base + 121, MAX);
        assert!(v.validate(tip, &past_limit, &store).is_ok());
        let backwards = header(tip.header().hash(), base - 1, MAX);
        assert!(v.validate(tip, &backwards, &store).is_ok());
    }

    #[test]
    fn relaxed_gap_does_not_decode_bits() {
        let (store, blocks) = chain(&[HARD]);
        let p = params(RetargetPolicy::PermissiveMinDifficulty, blocks[0].header());
        let tip = &blocks[1];
        let negative_bits = header(tip.header().hash(), tip.header().time.0 + 600, 0x04923456);
        assert!(check_difficulty_transition(&p, tip, &negative_bits, &store).is_ok());

        let short = header(tip.header().hash(), tip.header().time.0 + 60, 0x04923456);
        assert!(matches!(
            check_difficulty_transition(&p, tip, &short, &store),
            Err(ConsensusError::MalformedTarget(TargetError::Negative(_)))
        ));
    }

    #[test]
    fn walk_stops_at_genesis() {
        let mut store = MemoryBlockStore::new();
        let genesis = StoredBlock::genesis(header(BlockHash::ZERO, 1_000, MAX)).unwrap();
        store.put(genesis.clone()).unwrap();
        let p = params(RetargetPolicy::PermissiveMinDifficulty, genesis.header());

        let next = header(genesis.header().hash(), 1_030, MAX);
        assert!(check_difficulty_transition(&p, &genesis, &next, &store).is_ok());
    }

    #[test]
    fn missing_history_is_a_storage_error() {
        let (mut store, blocks) = chain(&[HARD, MAX, MAX]);
        let p = params(RetargetPolicy::PermissiveMinDifficulty, blocks[0].header());
        store.remove(&blocks[2].header().hash());
        let tip = &blocks[3];
        let next = header(tip.header().hash(), tip.header().time.0 + 10, HARD);
        assert!(matches!(
            check_difficulty_transition(&p, tip, &next, &store),
            Err(ConsensusError::Storage(StoreError::BlockNotFound(hash)))
                if hash == blocks[2].header().hash()
        ));
    }

    #[test]
    fn error_messages_carry_compact_bits() {
        let err = ConsensusError::DisallowedTransition {
            expected: CompactTarget(HARD),
            actual: CompactTarget(MAX),
        };
        assert_eq!(
            err.to_string(),
            "testnet block transition that is not allowed: 1d0fffff vs 1e0fffff"
        );
    }
}
