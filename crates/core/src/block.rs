//! Blocks, their payloads and sealing.
//!
//! A block starts life as a [`Draft`] holding only its payload. The ledger
//! seals it by assigning height, timestamp and previous hash, at which point
//! the block hash is computed once and the block is never modified again.

use crate::crypto::Address;
use crate::hash::{hash_concat, Hash};
use crate::star::{EncodedStar, Star, StarError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed marker carried by the genesis block.
pub const GENESIS_MARKER: &str = "First block in the chain - Genesis block";

/// What a block records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// The genesis marker.
    Genesis,
    /// A star registered to the wallet that proved ownership of `address`.
    StarClaim { address: Address, star: EncodedStar },
}

impl Payload {
    pub fn address(&self) -> Option<&Address> {
        match self {
            Payload::Genesis => None,
            Payload::StarClaim { address, .. } => Some(address),
        }
    }

    /// Canonical bytes fed into the block hash.
    fn encode(&self) -> Vec<u8> {
        // Strings and fixed arrays always serialize.
        bincode::serialize(self).expect("serialization should not fail")
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Genesis => f.write_str(GENESIS_MARKER),
            Payload::StarClaim { address, star } => {
                write!(f, "star ({}, {}) owned by {}", star.ra, star.dec, address)
            }
        }
    }
}

/// A payload in the form handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DecodedPayload {
    Genesis(String),
    StarClaim { address: Address, star: Star },
}

/// A block that has not been placed in the chain yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub payload: Payload,
}

impl Draft {
    pub fn genesis() -> Self {
        Self {
            payload: Payload::Genesis,
        }
    }

    pub fn star_claim(address: Address, star: EncodedStar) -> Self {
        Self {
            payload: Payload::StarClaim { address, star },
        }
    }
}

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Zero-based position in the ledger.
    pub height: u64,
    /// Unix seconds at which the block was appended.
    pub timestamp: u64,
    /// Hash of the block at `height - 1`, or [`Hash::ZERO`] for genesis.
    pub previous_hash: Hash,
    pub payload: Payload,
    /// Digest of the four fields above, fixed at sealing time.
    pub hash: Hash,
}

impl Block {
    /// Seal a draft into a positioned, hashed block.
    pub fn seal(draft: Draft, height: u64, previous_hash: Hash, timestamp: u64) -> Self {
        let hash = Self::digest(height, &draft.payload, timestamp, &previous_hash);
        Self {
            height,
            timestamp,
            previous_hash,
            payload: draft.payload,
            hash,
        }
    }

    /// Hash over `(height, payload, timestamp, previous_hash)`, in that order.
    fn digest(height: u64, payload: &Payload, timestamp: u64, previous_hash: &Hash) -> Hash {
        hash_concat(&[
            &height.to_le_bytes(),
            &payload.encode(),
            &timestamp.to_le_bytes(),
            previous_hash.as_bytes(),
        ])
    }

    /// Recompute the hash from the stored fields.
    pub fn compute_hash(&self) -> Hash {
        Self::digest(self.height, &self.payload, self.timestamp, &self.previous_hash)
    }

    pub fn has_valid_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && matches!(self.payload, Payload::Genesis)
    }

    /// Owner address for star claims.
    pub fn address(&self) -> Option<&Address> {
        self.payload.address()
    }

    /// Return the payload with the star story decoded.
    pub fn decode_payload(&self) -> Result<DecodedPayload, StarError> {
        match &self.payload {
            Payload::Genesis => Ok(DecodedPayload::Genesis(GENESIS_MARKER.to_string())),
            Payload::StarClaim { address, star } => Ok(DecodedPayload::StarClaim {
                address: *address,
                star: star.decode()?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn claim(address: Address) -> Draft {
        Draft::star_claim(address, Star::new("1h", "2d", "a story").encode())
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::seal(Draft::genesis(), 0, Hash::ZERO, 1_700_000_000);

        assert!(genesis.is_genesis());
        assert_eq!(genesis.previous_hash, Hash::ZERO);
        assert_eq!(genesis.payload, Payload::Genesis);
        assert!(genesis.address().is_none());
        assert_eq!(
            genesis.decode_payload().unwrap(),
            DecodedPayload::Genesis(GENESIS_MARKER.to_string())
        );
    }

    #[test]
    fn test_seal_is_deterministic() {
        let addr = Keypair::generate().address();
        let a = Block::seal(claim(addr), 1, Hash::ZERO, 10);
        let b = Block::seal(claim(addr), 1, Hash::ZERO, 10);
        assert_eq!(a.hash, b.hash);
        assert!(a.has_valid_hash());
    }

    #[test]
    fn test_every_field_feeds_the_hash() {
        let addr = Keypair::generate().address();
        let base = Block::seal(claim(addr), 1, Hash::ZERO, 10);

        let other_height = Block::seal(claim(addr), 2, Hash::ZERO, 10);
        let other_time = Block::seal(claim(addr), 1, Hash::ZERO, 11);
        let other_prev = Block::seal(claim(addr), 1, crate::hash::hash(b"x"), 10);
        let other_payload = Block::seal(claim(Address::ZERO), 1, Hash::ZERO, 10);

        for block in [other_height, other_time, other_prev, other_payload] {
            assert_ne!(block.hash, base.hash);
        }
    }

    #[test]
    fn test_tampering_is_detected() {
        let addr = Keypair::generate().address();
        let mut block = Block::seal(claim(addr), 1, Hash::ZERO, 10);

        block.timestamp += 1;
        assert!(!block.has_valid_hash());

        block.timestamp -= 1;
        assert!(block.has_valid_hash());

        block.payload = Payload::Genesis;
        assert!(!block.has_valid_hash());
    }

    #[test]
    fn test_decode_star_payload() {
        let addr = Keypair::generate().address();
        let star = Star::new("1h", "2d", "a story").with_constellation("Lyra");
        let block = Block::seal(Draft::star_claim(addr, star.encode()), 3, Hash::ZERO, 5);

        assert_eq!(block.address(), Some(&addr));
        assert_eq!(
            block.decode_payload().unwrap(),
            DecodedPayload::StarClaim { address: addr, star }
        );
    }

    #[test]
    fn test_bincode_roundtrip_keeps_hash_valid() {
        let addr = Keypair::generate().address();
        let block = Block::seal(claim(addr), 4, crate::hash::hash(b"prev"), 99);
        let bytes = bincode::serialize(&block).unwrap();
        let restored: Block = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, block);
        assert!(restored.has_valid_hash());
    }
}
