//! Consensus parameters that drive difficulty retargeting.
//!
//! A [`ChainParams`] value is built once, either from a preset or from a YAML
//! document, and is only read afterwards.

use crate::compact::{CompactTarget, TargetError};
use crate::network;
use crate::primitives::{BlockHash, BlockHeight, Target};
use getset::CopyGetters;
use serde::Deserialize;
use std::io::Read;
use thiserror::Error;

// -------------------------------------------------------------------------- //
// Retarget Policy

/// How blocks between two retarget points are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetargetPolicy {
    /// The target must stay the same as the parent's.
    #[default]
    Standard,
    /// Test network rule: after a long pause a block may use the easiest
    /// target, otherwise it repeats the target of the last block that did not.
    PermissiveMinDifficulty,
}

// -------------------------------------------------------------------------- //
// Chain Parameters

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("target spacing must be positive")]
    ZeroSpacing,
    #[error("target timespan {timespan}s is not a positive multiple of the target spacing {spacing}s")]
    TimespanNotMultiple { timespan: u32, spacing: u32 },
    #[error("invalid proof of work limit")]
    MaxTarget(#[from] TargetError),
    #[error("invalid chain parameters document")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, CopyGetters, Deserialize)]
#[serde(try_from = "ChainParamsConfig")]
pub struct ChainParams {
    /// Expected seconds between two blocks.
    #[getset(get_copy = "pub")]
    target_spacing: u32,
    /// Expected seconds for a full retarget interval.
    #[getset(get_copy = "pub")]
    target_timespan: u32,
    /// Proof of work limit, the easiest target a block may declare.
    #[getset(get_copy = "pub")]
    max_target: CompactTarget,
    max_target_value: Target,
    #[getset(get_copy = "pub")]
    retarget_policy: RetargetPolicy,
    #[getset(get_copy = "pub")]
    genesis_hash: BlockHash,
}

/// Serialized form of [`ChainParams`], checked on conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainParamsConfig {
    pub target_spacing: u32,
    pub target_timespan: u32,
    pub max_target: CompactTarget,
    #[serde(default)]
    pub retarget_policy: RetargetPolicy,
    pub genesis_hash: BlockHash,
}

impl TryFrom<ChainParamsConfig> for ChainParams {
    type Error = ParamsError;

    fn try_from(config: ChainParamsConfig) -> Result<Self, Self::Error> {
        ChainParams::new(
            config.target_spacing,
            config.target_timespan,
            config.max_target,
            config.retarget_policy,
            config.genesis_hash,
        )
    }
}

impl ChainParams {
    pub fn new(
        target_spacing: u32,
        target_timespan: u32,
        max_target: CompactTarget,
        retarget_policy: RetargetPolicy,
        genesis_hash: BlockHash,
    ) -> Result<Self, ParamsError> {
        if target_spacing == 0 {
            return Err(ParamsError::ZeroSpacing);
        }
        if target_timespan == 0 || target_timespan % target_spacing != 0 {
            return Err(ParamsError::TimespanNotMultiple {
                timespan: target_timespan,
                spacing: target_spacing,
            });
        }
        let max_target_value = max_target.to_target()?;
        Ok(ChainParams {
            target_spacing,
            target_timespan,
            max_target,
            max_target_value,
            retarget_policy,
            genesis_hash,
        })
    }

    /// Consensus parameters of the public test network.
    pub fn testnet() -> Self {
        let info = &network::TESTNET;
        let max_target = CompactTarget(0x1e0fffff);
        ChainParams {
            target_spacing: 60,
            target_timespan: 720 * 60,
            max_target,
            max_target_value: Target(ethnum::u256::from(0x0fffffu32) << (8 * 27u32)),
            retarget_policy: RetargetPolicy::PermissiveMinDifficulty,
            genesis_hash: info.genesis_hash(),
        }
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ParamsError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_reader<R: Read>(reader: R) -> Result<Self, ParamsError> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Number of blocks between two retarget points.
    pub fn retarget_interval(&self) -> u64 {
        u64::from(self.target_timespan / self.target_spacing)
    }

    /// Whether a block at `height` must carry a freshly computed target.
    pub fn is_retarget_height(&self, height: BlockHeight) -> bool {
        height.is_multiple_of(self.retarget_interval())
    }

    /// The proof of work limit in expanded form.
    pub fn max_target_value(&self) -> Target {
        self.max_target_value
    }

    pub fn allows_min_difficulty_blocks(&self) -> bool {
        self.retarget_policy == RetargetPolicy::PermissiveMinDifficulty
    }
}
