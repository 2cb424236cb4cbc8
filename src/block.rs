use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Message stored in the first block of every chain.
pub const GENESIS_MESSAGE: &str = "Genesis Block";

/// Sentinel predecessor hash of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Local time, second precision, no zone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SHA-256 hash as lowercase hex string.
pub type BlockHash = String;

/// One entry of the chain: a message plus the hash linking it to its predecessor.
///
/// Fields are only writable inside the crate. The serialized field order matches
/// the on-disk record layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) message: String,
    pub(crate) timestamp: String,
    pub(crate) hash: BlockHash,
    pub(crate) previous_hash: BlockHash,
}

impl Block {
    /// Create a block stamped with the current local time.
    pub fn new(index: u64, message: impl Into<String>, previous_hash: impl Into<String>) -> Self {
        Self::with_timestamp(index, message, previous_hash, now_timestamp())
    }

    /// Create a block with an explicit timestamp (for reloading / determinism).
    pub fn with_timestamp(
        index: u64,
        message: impl Into<String>,
        previous_hash: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let previous_hash = previous_hash.into();
        let timestamp = timestamp.into();
        let hash = content_hash(index, &message, &timestamp, &previous_hash);
        Self {
            index,
            message,
            timestamp,
            hash,
            previous_hash,
        }
    }

    /// The fixed first block of a fresh chain.
    pub fn genesis() -> Self {
        Self::new(0, GENESIS_MESSAGE, GENESIS_PREVIOUS_HASH)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The stored hash. After a reload this is whatever the file said.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    /// Hash of the current field values. Does not touch the stored hash.
    pub fn recompute_hash(&self) -> BlockHash {
        content_hash(self.index, &self.message, &self.timestamp, &self.previous_hash)
    }

    /// Whether the stored hash still matches the block's fields.
    pub fn verify(&self) -> bool {
        self.recompute_hash() == self.hash
    }
}

/// Compute the SHA-256 hex digest of some data.
pub fn compute_hash(data: &[u8]) -> BlockHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

// Plain concatenation without separators; existing chain files depend on it.
fn content_hash(index: u64, message: &str, timestamp: &str, previous_hash: &str) -> BlockHash {
    let payload = format!("{}{}{}{}", index, message, timestamp, previous_hash);
    compute_hash(payload.as_bytes())
}

fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_HASH: &str = "dd72882df544cef5a1d834e88a0f5fc93bbe8b39cc10b91eef57ad2fa3058962";

    #[test]
    fn hash_matches_known_vectors() {
        let genesis = Block::with_timestamp(0, GENESIS_MESSAGE, "0", "2024-01-01 00:00:00");
        assert_eq!(genesis.hash(), GENESIS_HASH);

        let next = Block::with_timestamp(1, "hello", GENESIS_HASH, "2024-01-01 00:00:05");
        assert_eq!(
            next.hash(),
            "56489249dbb85b61b66edbf835af058b25687498f992e169df0f8befcd21e98b"
        );
    }

    #[test]
    fn deterministic_with_same_inputs() {
        let b1 = Block::with_timestamp(3, "msg", "abc", "2024-05-05 12:00:00");
        let b2 = Block::with_timestamp(3, "msg", "abc", "2024-05-05 12:00:00");
        assert_eq!(b1.hash, b2.hash);
        assert!(b1.verify());
    }

    #[test]
    fn genesis_fields() {
        let g = Block::genesis();
        assert_eq!(g.index(), 0);
        assert_eq!(g.message(), "Genesis Block");
        assert_eq!(g.previous_hash(), "0");
        assert_eq!(g.hash().len(), 64);
        assert!(g.verify());
    }

    #[test]
    fn timestamp_has_second_precision() {
        let b = Block::new(1, "", "0");
        assert_eq!(b.timestamp().len(), "2024-01-01 00:00:00".len());
        assert!(chrono::NaiveDateTime::parse_from_str(b.timestamp(), TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn empty_message_is_allowed() {
        let b = Block::with_timestamp(1, "", "0", "2024-01-01 00:00:00");
        assert_eq!(b.hash, compute_hash(b"12024-01-01 00:00:000"));
    }

    #[test]
    fn tampered_block_fails_verify() {
        let mut b = Block::with_timestamp(1, "original", "0", "2024-01-01 00:00:00");
        b.message = "tampered".into();
        assert!(!b.verify());
        // the stored hash is left alone
        assert_ne!(b.recompute_hash(), b.hash);
    }
}
