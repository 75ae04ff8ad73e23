//! Core ledger primitives for starchain.
//!
//! This crate provides the types the ledger is built from:
//! - Hashing (BLAKE3)
//! - Wallet addresses, keys and signature verification
//! - Star records
//! - Blocks, payloads and sealing
//! - Ownership challenges
//! - Clocks

pub mod block;
pub mod challenge;
pub mod clock;
pub mod crypto;
pub mod hash;
pub mod star;

// Re-export commonly used types at the crate root
pub use block::{Block, DecodedPayload, Draft, Payload, GENESIS_MARKER};
pub use challenge::{
    issue_challenge, Challenge, ChallengeError, CHALLENGE_TAG, CHALLENGE_WINDOW_SECS,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::{
    Address, CryptoError, Ed25519Verifier, Keypair, PublicKey, SignatureVerifier, WalletSignature,
};
pub use hash::{hash, hash_concat, Hash, H256};
pub use star::{EncodedStar, Star, StarError, MAX_STORY_BYTES};
