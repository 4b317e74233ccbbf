//! Static identity of the test network.
//!
//! Nothing in here takes part in difficulty validation apart from the genesis
//! hash, which [`ChainParams::testnet`](crate::params::ChainParams::testnet)
//! shares. The values are published so that the surrounding engine can read
//! them from one place.

use crate::compact::CompactTarget;
use crate::primitives::{BlockHash, BlockHeight, BlockNonce, BlockTime, Hash256};
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bip32Headers {
    pub public: u32,
    pub private: u32,
}

/// Block version supermajority thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MajorityRules {
    pub enforce_block_upgrade: u32,
    pub reject_block_outdated: u32,
    pub window: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisInfo {
    pub time: BlockTime,
    pub bits: CompactTarget,
    pub nonce: BlockNonce,
    /// Stored in internal byte order.
    pub hash: BlockHash,
}

/// Scheduled change of the retarget timespan. Not applied by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowChange {
    pub height: BlockHeight,
    /// Seconds per retarget window from `height` on.
    pub target_timespan: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    pub packet_magic: u32,
    pub port: u16,
    pub address_header: u8,
    pub p2sh_header: u8,
    pub dumped_private_key_header: u8,
    pub bip32_headers: Bip32Headers,
    pub majority: MajorityRules,
    pub genesis: GenesisInfo,
    pub pow_change: PowChange,
    pub spendable_coinbase_depth: u32,
    pub subsidy_halving_interval: u32,
    pub alert_signing_key: &'static str,
    pub dns_seeds: &'static [&'static str],
    /// IPv4 seeds packed little-endian, i.e. the first octet is the low byte.
    pub addr_seeds: &'static [u32],
    pub payment_protocol_id: &'static str,
}

// -------------------------------------------------------------------------- //
// Test Network

pub const TESTNET: NetworkInfo = NetworkInfo {
    packet_magic: 0xcaca_caca,
    port: 11946,
    address_header: 87,
    p2sh_header: 196,
    dumped_private_key_header: 239,
    bip32_headers: Bip32Headers {
        // base58 "tpub" / "tprv"
        public: 0x0435_87cf,
        private: 0x0435_8394,
    },
    majority: MajorityRules {
        enforce_block_upgrade: 51,
        reject_block_outdated: 75,
        window: 100,
    },
    genesis: GenesisInfo {
        time: BlockTime(1_493_596_800),
        bits: CompactTarget(0x1e0ffff0),
        nonce: BlockNonce(560_278),
        // ae48f41a796dfffad00bfdb10c6597cb380f5a49681ced87777084cd75076c6f
        hash: BlockHash(Hash256([
            0x6f, 0x6c, 0x07, 0x75, 0xcd, 0x84, 0x70, 0x77, 0x87, 0xed, 0x1c, 0x68, 0x49, 0x5a,
            0x0f, 0x38, 0xcb, 0x97, 0x65, 0x0c, 0xb1, 0xfd, 0x0b, 0xd0, 0xfa, 0xff, 0x6d, 0x79,
            0x1a, 0xf4, 0x48, 0xae,
        ])),
    },
    pow_change: PowChange {
        height: BlockHeight(720),
        target_timespan: 60,
    },
    spendable_coinbase_depth: 100,
    subsidy_halving_interval: 210_000,
    alert_signing_key: "04302390343f91cc401d56d68b123028bf52e5fca1939df127f63c6467cdf9c8e2c14b61104cf817d0b780da337893ecc4aaff1309e536162dabbdb45200ca2b0a",
    dns_seeds: &[],
    addr_seeds: &[0x4398_bd05, 0x706a_d990],
    payment_protocol_id: "test",
};

impl NetworkInfo {
    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis.hash
    }

    pub fn acceptable_address_codes(&self) -> [u8; 2] {
        [self.address_header, self.p2sh_header]
    }

    pub fn alert_signing_key(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(self.alert_signing_key)
    }

    pub fn seed_addrs(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.addr_seeds
            .iter()
            .map(|&seed| Ipv4Addr::from(seed.to_le_bytes()))
    }
}
