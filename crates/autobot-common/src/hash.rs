//! Content hashing for vehicle records
//!
//! A [`ContentHash`] identifies a record by its business fields only. Fields are
//! fed to BLAKE3 in a fixed order, each prefixed with its byte length, so the
//! encoding is unambiguous and identical on every platform and across restarts.
//! The first eight bytes of the digest, read little-endian, form the 64-bit key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AutobotError;

/// 64-bit content hash, the primary key of the vehicle store
///
/// Its external representation is the decimal string of the integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(u64);

impl ContentHash {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Decimal key used when the store is persisted externally
    pub fn as_key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentHash {
    type Err = AutobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ContentHash)
            .map_err(|e| AutobotError::Hash(format!("invalid content hash '{}': {}", s, e)))
    }
}

impl TryFrom<String> for ContentHash {
    type Error = AutobotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.as_key()
    }
}

impl From<u64> for ContentHash {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Incremental builder for a [`ContentHash`]
///
/// The order of `field` calls is part of the hash; callers must always feed
/// fields in the same order.
pub struct ContentHasher {
    inner: blake3::Hasher,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Append one length-prefixed field
    pub fn field(&mut self, value: &str) -> &mut Self {
        let bytes = value.as_bytes();
        self.inner.update(&(bytes.len() as u64).to_le_bytes());
        self.inner.update(bytes);
        self
    }

    pub fn finish(&self) -> ContentHash {
        let digest = self.inner.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        ContentHash(u64::from_le_bytes(head))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a fixed sequence of fields in one call
pub fn hash_fields<'a, I>(fields: I) -> ContentHash
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = ContentHasher::new();
    for field in fields {
        hasher.field(field);
    }
    hasher.finish()
}
