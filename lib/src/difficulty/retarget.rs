//! Difficulty recalculation at retarget points.
//!
//! Every `retarget_interval` blocks the target is scaled by how long the last
//! interval actually took compared to `target_timespan`. The adjustment is
//! limited to a factor of four in either direction and never goes above the
//! proof of work limit.

use super::ConsensusError;
use crate::compact::CompactTarget;
use crate::header::stored::StoredBlock;
use crate::header::BlockHeader;
use crate::params::ChainParams;
use crate::primitives::{uint_as_rational, Target};
use crate::store::{BlockStore, Error as StoreError};
use num_rational::BigRational;
use tracing::{debug, trace, warn};

/// Maximum factor by which one retarget may change the target.
pub const MAX_ADJUSTMENT_FACTOR: i64 = 4;

/// Check the target of `next`, which sits at a retarget height on top of
/// `prev`.
pub fn check_retarget<S>(
    params: &ChainParams,
    prev: &StoredBlock,
    next: &BlockHeader,
    store: &S,
) -> Result<(), ConsensusError>
where
    S: BlockStore + ?Sized,
{
    let expected = expected_target(params, prev, store)?;
    let expected_value = expected.to_target()?;
    let received = next.target()?;

    if received != expected_value {
        debug!(
            height = prev.height().succ().0,
            expected = %expected,
            actual = %next.bits,
            "retarget mismatch"
        );
        return Err(ConsensusError::RetargetMismatch {
            height: prev.height().succ(),
            expected,
            actual: next.bits,
        });
    }
    Ok(())
}

/// The only target a block on top of `prev` may declare, in compact form.
pub fn expected_target<S>(
    params: &ChainParams,
    prev: &StoredBlock,
    store: &S,
) -> Result<CompactTarget, ConsensusError>
where
    S: BlockStore + ?Sized,
{
    let first = window_start(params, prev, store)?;
    let actual_timespan = prev.header().time.seconds_since(first.header().time);
    let prev_target = prev.header().target()?;
    let next = next_target(params, &prev_target, actual_timespan);
    debug!(
        height = prev.height().succ().0,
        actual_timespan,
        bits = %next.to_compact(),
        "computed retarget"
    );
    Ok(next.to_compact())
}

/// First block of the interval that ends with `prev`.
fn window_start<S>(
    params: &ChainParams,
    prev: &StoredBlock,
    store: &S,
) -> Result<StoredBlock, StoreError>
where
    S: BlockStore + ?Sized,
{
    let mut cursor = prev.clone();
    for _ in 1..params.retarget_interval() {
        cursor = cursor.prev(store)?;
        trace!(height = cursor.height().0, "retarget window");
    }
    Ok(cursor)
}

/// Scale `prev_target` by `actual_timespan / target_timespan`.
///
/// The timespan is clamped before scaling, the result is capped at the proof
/// of work limit.
pub fn next_target(params: &ChainParams, prev_target: &Target, actual_timespan: i64) -> Target {
    let timespan = i64::from(params.target_timespan());
    let clamped = actual_timespan.clamp(
        timespan / MAX_ADJUSTMENT_FACTOR,
        timespan * MAX_ADJUSTMENT_FACTOR,
    );

    let quotient: BigRational =
        prev_target.as_rational() * uint_as_rational(clamped) / uint_as_rational(timespan);
    let new_target = Target::from_rational(&quotient.floor());

    if new_target > params.max_target_value() {
        warn!(
            bits = %new_target.to_compact(),
            "difficulty hit proof of work limit"
        );
        return params.max_target_value();
    }
    new_target
}
