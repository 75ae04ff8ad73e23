//! Persistent storage for starchain.
//!
//! The ledger keeps its chain in memory. This crate saves ledger snapshots
//! to an embedded sled database and loads them back on startup.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            Ledger (in memory)            │
//! └───────────┬──────────────────▲───────────┘
//!    snapshot │                  │ from_blocks
//! ┌───────────▼──────────────────┴───────────┐
//! │  ChainStore                              │
//! │  - block:height:{h}  → block             │
//! │  - block:hash:{hash} → height            │
//! │  - chain:height      → newest height     │
//! └───────────┬──────────────────────────────┘
//! ┌───────────▼──────────────────────────────┐
//! │  Storage (sled wrapper, bincode values)  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use starchain_core::{Block, Draft, Hash};
//! use starchain_storage::{ChainStore, Storage};
//!
//! let storage = Storage::open("./starchain_data").unwrap();
//! let store = ChainStore::new(&storage);
//!
//! let genesis = Block::seal(Draft::genesis(), 0, Hash::ZERO, 0);
//! store.save_snapshot(&[genesis]).unwrap();
//! let blocks = store.load_snapshot().unwrap();
//! ```

pub mod chain;
pub mod db;

// Re-export commonly used types
pub use chain::ChainStore;
pub use db::{Result, Storage, StorageError};
