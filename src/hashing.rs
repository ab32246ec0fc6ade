// Copyright 2025 Cowboy AI, LLC.

//! Fast, non-cryptographic hashing for cache keys and fingerprints

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::{xxh3_128, xxh3_64};

use crate::errors::{DomainError, DomainResult};

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgo {
    /// 64-bit xxh3, 16 hex chars
    #[default]
    Xxh3,
    /// 128-bit xxh3, 32 hex chars
    Xxh3_128,
}

impl HashAlgo {
    /// Parse a configured algorithm name
    pub fn parse(name: &str) -> DomainResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "xxh3" | "xxh3_64" => Ok(HashAlgo::Xxh3),
            "xxh3_128" | "xxh128" => Ok(HashAlgo::Xxh3_128),
            other => Err(DomainError::configuration(format!(
                "Unsupported hash algorithm: {other}"
            ))),
        }
    }

    /// Configured name
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgo::Xxh3 => "xxh3",
            HashAlgo::Xxh3_128 => "xxh3_128",
        }
    }
}

/// Description returned by [`FastHasher::info`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashInfo {
    /// Algorithm name
    pub algo: &'static str,
    /// Human note
    pub note: &'static str,
}

/// Hex digests over arbitrary bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct FastHasher {
    algo: HashAlgo,
}

impl FastHasher {
    /// Hasher for `algo`
    pub fn new(algo: HashAlgo) -> Self {
        Self { algo }
    }

    /// Algorithm in use
    pub fn algo(&self) -> HashAlgo {
        self.algo
    }

    /// Hex digest of `value`
    pub fn make(&self, value: impl AsRef<[u8]>) -> String {
        let bytes = value.as_ref();
        match self.algo {
            HashAlgo::Xxh3 => format!("{:016x}", xxh3_64(bytes)),
            HashAlgo::Xxh3_128 => format!("{:032x}", xxh3_128(bytes)),
        }
    }

    /// Compare `value` against a digest without early exit on mismatch
    pub fn check(&self, value: impl AsRef<[u8]>, hashed: &str) -> bool {
        let made = self.make(value);
        if made.len() != hashed.len() {
            return false;
        }
        made.bytes()
            .zip(hashed.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// Fast digests never need rehashing
    pub fn needs_rehash(&self, _hashed: &str) -> bool {
        false
    }

    /// Algorithm description
    pub fn info(&self) -> HashInfo {
        HashInfo {
            algo: self.algo.as_str(),
            note: "Non-cryptographic fast hash",
        }
    }
}
