use std::fmt;
use std::str::FromStr;

use blake2::digest::consts::U48;
use blake2::Blake2b;
use digest::Digest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A hex-encoded 384-bit (48 byte) content digest, computed over raw archive
/// or resource bytes. The same algorithm is used everywhere a `hash=` query
/// parameter or stored digest is compared.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 48]);

type Blake2b384 = Blake2b<U48>;

#[derive(Debug, Error)]
pub enum HashParseError {
    #[error("hash must be exactly 96 hex characters, got {0}")]
    WrongLength(usize),
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl ContentHash {
    pub const LEN: usize = 48;

    pub fn from_bytes(bytes: [u8; 48]) -> Self {
        ContentHash(bytes)
    }

    /// Incrementally hashes a byte stream. Callers that already have the
    /// whole buffer should prefer `hash_bytes`.
    pub fn hasher() -> ContentHasher {
        ContentHasher(Blake2b384::new())
    }

    pub fn hash_bytes(data: &[u8]) -> Self {
        let mut hasher = Self::hasher();
        hasher.update(data);
        hasher.finish()
    }

    pub fn as_bytes(&self) -> &[u8; 48] {
        &self.0
    }
}

/// Wraps the incremental digest so callers never see the underlying crate.
pub struct ContentHasher(Blake2b384);

impl ContentHasher {
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn finish(self) -> ContentHash {
        let out = self.0.finalize();
        let mut bytes = [0u8; 48];
        bytes.copy_from_slice(&out);
        ContentHash(bytes)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self)
    }
}

impl FromStr for ContentHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::LEN * 2 {
            return Err(HashParseError::WrongLength(s.len()));
        }
        let decoded = hex::decode(s)?;
        let mut bytes = [0u8; 48];
        bytes.copy_from_slice(&decoded);
        Ok(ContentHash(bytes))
    }
}
