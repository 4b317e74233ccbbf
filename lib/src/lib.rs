//! Proof-of-work difficulty transition checks for Bitcoin-derived chains.
//!
//! The entry point is [`DifficultyTransitionValidator`]: given the stored
//! parent of a candidate block, the candidate header and read access to the
//! chain history, it decides whether the target declared by the candidate is
//! allowed at its height.

pub mod compact;
pub mod difficulty;
pub mod header;
pub mod network;
pub mod params;
pub mod primitives;
pub mod store;

pub use compact::{CompactTarget, TargetError};
pub use difficulty::{check_difficulty_transition, ConsensusError, DifficultyTransitionValidator};
pub use header::stored::StoredBlock;
pub use header::BlockHeader;
pub use params::{ChainParams, ParamsError, RetargetPolicy};
pub use store::memory::MemoryBlockStore;
pub use store::BlockStore;
