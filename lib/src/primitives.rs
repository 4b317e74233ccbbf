use ethnum::u256;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::Signed;
use std::fmt;

// -------------------------------------------------------------------------- //
// Primitives Types

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash256(pub [u8; 32]);

/// Identity of a block header: the double SHA-256 of its consensus fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct BlockHash(pub Hash256);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MerkleRoot(pub Hash256);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockVersion(pub i32);

/// Block creation time in seconds since the POSIX epoch.
///
/// Headers carry an unsigned 32-bit value. Arithmetic between two block times
/// is always done on signed 64-bit seconds because the difference may be
/// negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockTime(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockNonce(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHeight(pub u64);

/// Expanded proof-of-work target. A block hash must not exceed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(pub u256);

/// Expected number of hashes needed to meet a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Work(pub u256);

// -------------------------------------------------------------------------- //
// Hashes

impl BlockHash {
    pub const ZERO: BlockHash = BlockHash(Hash256([0; 32]));

    /// Parse the conventional display form (byte-reversed hex).
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        bytes.reverse();
        Ok(BlockHash(Hash256(bytes)))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bytes = self.0 .0;
        bytes.reverse();
        f.write_str(&hex::encode(bytes))
    }
}

impl TryFrom<String> for BlockHash {
    type Error = hex::FromHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        BlockHash::from_hex(&s)
    }
}

impl From<BlockHash> for String {
    fn from(hash: BlockHash) -> String {
        hash.to_string()
    }
}

// -------------------------------------------------------------------------- //
// BlockTime

impl BlockTime {
    /// Signed number of seconds from `earlier` to `self`.
    pub fn seconds_since(self, earlier: BlockTime) -> i64 {
        i64::from(self.0) - i64::from(earlier.0)
    }
}

// -------------------------------------------------------------------------- //
// BlockHeight

impl BlockHeight {
    pub fn pred(self) -> BlockHeight {
        BlockHeight(self.0 - 1)
    }

    pub fn succ(self) -> BlockHeight {
        BlockHeight(self.0 + 1)
    }

    pub fn is_multiple_of(self, interval: u64) -> bool {
        self.0 % interval == 0
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// -------------------------------------------------------------------------- //
// Target

pub fn u256_as_rational(x: u256) -> BigRational {
    BigRational::from(BigInt::from_bytes_le(
        num_bigint::Sign::Plus,
        &x.to_le_bytes(),
    ))
}

/// Truncates `x` to an integer. Negative values map to zero and values above
/// 2^256 - 1 saturate.
pub fn u256_from_rational(x: &BigRational) -> u256 {
    if x.is_negative() {
        return u256::ZERO;
    }
    let (_, mut bytes) = x.to_integer().to_bytes_le();
    if bytes.len() > 32 {
        return u256::MAX;
    }
    bytes.resize(32, 0);
    let mut le = [0u8; 32];
    le.copy_from_slice(&bytes);
    u256::from_le_bytes(le)
}

pub fn uint_as_rational<T: Integer>(x: T) -> BigRational
where
    BigInt: From<T>,
{
    BigRational::from(BigInt::from(x))
}

impl Target {
    pub fn as_rational(&self) -> BigRational {
        u256_as_rational(self.0)
    }

    pub fn from_rational(x: &BigRational) -> Self {
        Target(u256_from_rational(x))
    }

    /// Work represented by a block with this target.
    ///
    /// Computed as `2^256 / (target + 1)` without leaving 256-bit arithmetic.
    /// A zero target saturates at `u256::MAX`.
    pub fn work(&self) -> Work {
        if self.0 == u256::ZERO {
            return Work(u256::MAX);
        }
        if self.0 == u256::MAX {
            return Work(u256::ONE);
        }
        Work((!self.0 / (self.0 + 1)) + 1)
    }
}

// -------------------------------------------------------------------------- //
// Work

impl Work {
    pub const ZERO: Work = Work(u256::ZERO);

    pub fn saturating_add(self, other: Work) -> Work {
        Work(self.0.saturating_add(other.0))
    }
}

// -------------------------------------------------------------------------- //
// Serialization of Header Fields

/// Little-endian consensus encoding of a header field, as it enters the block
/// hash.
pub trait ToHeaderBytes {
    fn to_header_bytes(&self) -> Vec<u8>;
}

impl ToHeaderBytes for Hash256 {
    fn to_header_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl ToHeaderBytes for BlockHash {
    fn to_header_bytes(&self) -> Vec<u8> {
        self.0.to_header_bytes()
    }
}

impl ToHeaderBytes for MerkleRoot {
    fn to_header_bytes(&self) -> Vec<u8> {
        self.0.to_header_bytes()
    }
}

impl ToHeaderBytes for u32 {
    fn to_header_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl ToHeaderBytes for i32 {
    fn to_header_bytes(&self) -> Vec<u8> {
        self.to_le_bytes().to_vec()
    }
}

impl ToHeaderBytes for BlockVersion {
    fn to_header_bytes(&self) -> Vec<u8> {
        self.0.to_header_bytes()
    }
}

impl ToHeaderBytes for BlockTime {
    fn to_header_bytes(&self) -> Vec<u8> {
        self.0.to_header_bytes()
    }
}

impl ToHeaderBytes for BlockNonce {
    fn to_header_bytes(&self) -> Vec<u8> {
        self.0.to_header_bytes()
    }
}
