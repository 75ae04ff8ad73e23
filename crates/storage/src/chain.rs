//! Block storage for ledger snapshots.
//!
//! The ledger itself lives in memory. `ChainStore` persists its blocks and
//! hands them back in order so the ledger can be rebuilt on the next start.

use crate::db::{Result, Storage, StorageError};
use starchain_core::{Block, Hash};
use tracing::debug;

/// Key for the height of the newest stored block.
const CHAIN_HEIGHT_KEY: &[u8] = b"chain:height";

/// Persists ledger blocks.
pub struct ChainStore<'a> {
    storage: &'a Storage,
}

impl<'a> ChainStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Height of the newest stored block, `None` before anything was saved.
    pub fn get_height(&self) -> Result<Option<u64>> {
        self.storage.get(CHAIN_HEIGHT_KEY)
    }

    pub fn is_initialized(&self) -> Result<bool> {
        self.storage.contains(CHAIN_HEIGHT_KEY)
    }

    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        self.storage.get(Storage::block_height_key(height))
    }

    /// Looks up the height through the hash index, then the block.
    pub fn get_block_by_hash(&self, hash: &Hash) -> Result<Option<Block>> {
        match self.storage.get::<_, u64>(Storage::block_hash_key(hash))? {
            Some(height) => self.get_block_by_height(height),
            None => Ok(None),
        }
    }

    /// Persist a ledger snapshot.
    ///
    /// Storage is append-only like the ledger: only blocks above the stored
    /// height are written, in one atomic batch. The snapshot must contain
    /// every stored block and agree with the stored tip. Returns the number of
    /// blocks written.
    pub fn save_snapshot(&self, blocks: &[Block]) -> Result<usize> {
        let stored = self.get_height()?;
        let next = stored.map_or(0, |h| h + 1);
        let given = blocks.len() as u64;

        if given < next {
            return Err(StorageError::Truncated {
                given,
                stored: next,
            });
        }

        if let Some(tip) = stored {
            let stored_tip = self
                .get_block_by_height(tip)?
                .ok_or(StorageError::MissingBlock(tip))?;
            if stored_tip.hash != blocks[tip as usize].hash {
                return Err(StorageError::Diverged(tip));
            }
        }

        let new_blocks = &blocks[next as usize..];
        let Some(last) = new_blocks.last() else {
            return Ok(0);
        };

        let mut writes = Vec::with_capacity(new_blocks.len() * 2 + 1);
        for block in new_blocks {
            writes.push((
                Storage::block_height_key(block.height),
                bincode::serialize(block)?,
            ));
            writes.push((
                Storage::block_hash_key(&block.hash),
                bincode::serialize(&block.height)?,
            ));
        }
        writes.push((CHAIN_HEIGHT_KEY.to_vec(), bincode::serialize(&last.height)?));

        self.storage.batch(writes)?;
        self.storage.flush()?;
        debug!(from = next, to = last.height, "saved ledger snapshot");

        Ok(new_blocks.len())
    }

    /// Load every stored block in height order. `None` if nothing was saved.
    pub fn load_snapshot(&self) -> Result<Option<Vec<Block>>> {
        let Some(height) = self.get_height()? else {
            return Ok(None);
        };

        let blocks = (0..=height)
            .map(|h| {
                self.get_block_by_height(h)?
                    .ok_or(StorageError::MissingBlock(h))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(height, "loaded ledger snapshot");
        Ok(Some(blocks))
    }
}
