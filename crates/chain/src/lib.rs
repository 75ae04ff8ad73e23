//! Star registry ledger for starchain.
//!
//! - **Ledger**: the append-only chain, ownership-verified submissions and lookups
//! - **Validation**: hash and link checks over the whole chain
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use starchain_chain::{Ledger, LedgerConfig};
//! use starchain_core::{Ed25519Verifier, Keypair, Star, SystemClock};
//!
//! let ledger = Ledger::new(LedgerConfig::default(), Arc::new(Ed25519Verifier), Arc::new(SystemClock));
//!
//! // The wallet signs the challenge it was handed.
//! let wallet = Keypair::generate();
//! let message = ledger.request_challenge(&wallet.address());
//! let signature = wallet.sign_message(&message).encode();
//!
//! let star = Star::new("16h 29m 1.0s", "-26° 29' 24.9", "First star I found");
//! let block = ledger.submit(&wallet.address(), &message, &signature, star).unwrap();
//!
//! assert_eq!(block.height, 1);
//! assert!(ledger.validate().is_empty());
//! ```

pub mod ledger;
pub mod validation;

// Re-export commonly used types
pub use ledger::{Ledger, LedgerConfig, LedgerError, LedgerStats, Result, StarRecord};
pub use validation::{check_block, validate_chain, ValidationIssue};
