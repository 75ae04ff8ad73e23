//! The star registry ledger.
//!
//! The ledger owns the ordered sequence of sealed blocks. Every mutation goes
//! through [`Ledger::append`], which holds the write lock while it reads the
//! tail and pushes the new block, so two submissions can never seal against
//! the same predecessor. Reads share a read lock and see a consistent chain.

use crate::validation::{check_block, validate_chain, ValidationIssue};
use parking_lot::RwLock;
use serde::Serialize;
use starchain_core::{
    issue_challenge, Address, Block, Challenge, ChallengeError, Clock, Draft, Hash, Payload,
    SignatureVerifier, Star, StarError, CHALLENGE_WINDOW_SECS,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("challenge issued at {issued_at} expired (now {now})")]
    ExpiredChallenge { issued_at: u64, now: u64 },

    #[error("signature does not prove ownership of the address")]
    InvalidSignature,

    #[error(transparent)]
    MalformedChallenge(#[from] ChallengeError),

    #[error("challenge was issued to {found}, not {expected}")]
    AddressMismatch { expected: Address, found: Address },

    #[error("invalid star: {0}")]
    InvalidStar(#[from] StarError),

    #[error("payload of block {height} cannot be decoded")]
    CorruptPayload { height: u64 },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("genesis payload cannot be appended; the ledger already holds genesis")]
    GenesisPayload,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Seconds a challenge stays valid after issuance.
    pub challenge_window_secs: u64,
    /// Fixed genesis timestamp. The clock is read when unset.
    pub genesis_timestamp: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            challenge_window_secs: CHALLENGE_WINDOW_SECS,
            genesis_timestamp: None,
        }
    }
}

/// A star as returned by address lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarRecord {
    pub height: u64,
    pub hash: Hash,
    pub timestamp: u64,
    pub address: Address,
    pub star: Star,
}

/// Ledger statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStats {
    pub height: u64,
    pub latest_hash: Hash,
    pub latest_timestamp: u64,
    /// Blocks carrying a star claim (every block but genesis).
    pub star_count: u64,
}

/// The guarded chain. `height` always equals `blocks.len() - 1`.
struct ChainState {
    blocks: Vec<Block>,
    height: u64,
}

impl ChainState {
    fn tip(&self) -> &Block {
        self.blocks.last().expect("ledger always holds the genesis block")
    }

    /// Seal `draft` on top of the current tail. Callers hold the write lock.
    fn push(&mut self, draft: Draft, timestamp: u64) -> Block {
        let (height, previous_hash) = match self.blocks.last() {
            Some(tail) => (self.height + 1, tail.hash),
            None => (0, Hash::ZERO),
        };

        let block = Block::seal(draft, height, previous_hash, timestamp);
        self.blocks.push(block.clone());
        self.height = height;
        block
    }
}

/// The append-only star registry.
pub struct Ledger {
    state: RwLock<ChainState>,
    verifier: Arc<dyn SignatureVerifier>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new(
        config: LedgerConfig,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut state = ChainState {
            blocks: Vec::new(),
            height: 0,
        };
        let timestamp = config.genesis_timestamp.unwrap_or_else(|| clock.now());
        let genesis = state.push(Draft::genesis(), timestamp);
        info!(hash = %genesis.hash, timestamp, "created genesis block");

        Self {
            state: RwLock::new(state),
            verifier,
            clock,
            config,
        }
    }

    /// Restore a ledger from a previously taken snapshot.
    ///
    /// The snapshot must start with the genesis block and hold contiguous
    /// heights. Hash and link damage is accepted here and reported by
    /// [`Ledger::validate`].
    pub fn from_blocks(
        blocks: Vec<Block>,
        config: LedgerConfig,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        match blocks.first() {
            None => return Err(LedgerError::InvalidSnapshot("no blocks".into())),
            Some(first) if !first.is_genesis() => {
                return Err(LedgerError::InvalidSnapshot(
                    "first block is not the genesis block".into(),
                ))
            }
            Some(_) => {}
        }
        if let Some((index, block)) = blocks
            .iter()
            .enumerate()
            .find(|(index, block)| block.height != *index as u64)
        {
            return Err(LedgerError::InvalidSnapshot(format!(
                "block at position {} has height {}",
                index, block.height
            )));
        }
        if let Some(block) = blocks
            .iter()
            .skip(1)
            .find(|block| block.payload == Payload::Genesis)
        {
            return Err(LedgerError::InvalidSnapshot(format!(
                "genesis payload at height {}",
                block.height
            )));
        }

        let height = blocks.len() as u64 - 1;
        info!(height, "restored ledger from snapshot");

        Ok(Self {
            state: RwLock::new(ChainState { blocks, height }),
            verifier,
            clock,
            config,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Height of the newest block.
    pub fn height(&self) -> u64 {
        self.state.read().height
    }

    /// Ordered copy of every sealed block.
    pub fn snapshot(&self) -> Vec<Block> {
        self.state.read().blocks.clone()
    }

    pub fn latest_block(&self) -> Block {
        self.state.read().tip().clone()
    }

    /// Seal `draft` as the next block, stamped with the clock's time.
    ///
    /// Genesis is sealed only by [`Ledger::new`], so a genesis draft is
    /// rejected with [`LedgerError::GenesisPayload`].
    pub fn append(&self, draft: Draft) -> Result<Block> {
        if draft.payload == Payload::Genesis {
            warn!("rejected genesis payload on append");
            return Err(LedgerError::GenesisPayload);
        }
        Ok(self.append_at(draft, self.clock.now()))
    }

    fn append_at(&self, draft: Draft, timestamp: u64) -> Block {
        let block = self.state.write().push(draft, timestamp);
        info!(height = block.height, hash = %block.hash, "appended block");
        block
    }

    // =========================================================================
    // Ownership verification
    // =========================================================================

    /// Issue a challenge for `address` at the current time.
    pub fn request_challenge(&self, address: &Address) -> String {
        issue_challenge(address, self.clock.now())
    }

    /// Register `star` to `address`, proven by `signature` over `message`.
    pub fn submit(
        &self,
        address: &Address,
        message: &str,
        signature: &str,
        star: Star,
    ) -> Result<Block> {
        self.submit_at(address, message, signature, star, self.clock.now())
    }

    /// Like [`Ledger::submit`], evaluated at `now`. The block is stamped `now`.
    ///
    /// Checks run in order and each one aborts before the chain changes:
    /// challenge format, challenge address, expiry, signature, star contents.
    pub fn submit_at(
        &self,
        address: &Address,
        message: &str,
        signature: &str,
        star: Star,
        now: u64,
    ) -> Result<Block> {
        let challenge = Challenge::parse(message)?;

        if challenge.address != *address {
            warn!(%address, challenge_address = %challenge.address, "challenge address mismatch");
            return Err(LedgerError::AddressMismatch {
                expected: *address,
                found: challenge.address,
            });
        }

        if challenge.is_expired(now, self.config.challenge_window_secs) {
            warn!(%address, issued_at = challenge.issued_at, now, "challenge expired");
            return Err(LedgerError::ExpiredChallenge {
                issued_at: challenge.issued_at,
                now,
            });
        }

        if !self.verifier.verify(message, address, signature) {
            warn!(%address, "signature rejected");
            return Err(LedgerError::InvalidSignature);
        }

        star.validate()?;

        debug!(%address, ra = %star.ra, dec = %star.dec, "ownership verified");
        Ok(self.append_at(Draft::star_claim(*address, star.encode()), now))
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn block_by_height(&self, height: u64) -> Option<Block> {
        let index = usize::try_from(height).ok()?;
        self.state.read().blocks.get(index).cloned()
    }

    pub fn block_by_hash(&self, hash: &Hash) -> Option<Block> {
        self.state
            .read()
            .blocks
            .iter()
            .find(|block| block.hash == *hash)
            .cloned()
    }

    /// Every star owned by `address`, in height order.
    pub fn stars_by_address(&self, address: &Address) -> Result<Vec<StarRecord>> {
        let state = self.state.read();
        let mut records = Vec::new();

        for block in &state.blocks {
            let Payload::StarClaim { address: owner, star } = &block.payload else {
                continue;
            };
            if owner != address {
                continue;
            }

            let star = star.decode().map_err(|_| LedgerError::CorruptPayload {
                height: block.height,
            })?;
            records.push(StarRecord {
                height: block.height,
                hash: block.hash,
                timestamp: block.timestamp,
                address: *owner,
                star,
            });
        }

        Ok(records)
    }

    /// Blocks in the inclusive range `[from, to]`, clipped to the chain.
    pub fn blocks_range(&self, from: u64, to: u64) -> Vec<Block> {
        let state = self.state.read();
        let to = to.min(state.height);
        if from > to {
            return Vec::new();
        }
        state.blocks[from as usize..=to as usize].to_vec()
    }

    /// The newest `count` blocks, most recent first.
    pub fn recent_blocks(&self, count: u64) -> Vec<Block> {
        self.state
            .read()
            .blocks
            .iter()
            .rev()
            .take(count as usize)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> LedgerStats {
        let state = self.state.read();
        let tip = state.tip();
        LedgerStats {
            height: state.height,
            latest_hash: tip.hash,
            latest_timestamp: tip.timestamp,
            star_count: state
                .blocks
                .iter()
                .filter(|block| block.address().is_some())
                .count() as u64,
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Recheck every block's hash and link. An empty result means the chain
    /// is internally consistent.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let issues = validate_chain(&self.state.read().blocks);
        for issue in &issues {
            warn!(height = issue.height(), %issue, "chain validation issue");
        }
        issues
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Check a single block against its predecessor. `None` when out of range.
    pub fn validate_block(&self, height: u64) -> Option<Vec<ValidationIssue>> {
        let state = self.state.read();
        let index = usize::try_from(height).ok()?;
        let block = state.blocks.get(index)?;
        let previous = index.checked_sub(1).and_then(|i| state.blocks.get(i));
        Some(check_block(block, previous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starchain_core::{Ed25519Verifier, Keypair, ManualClock};

    const START: u64 = 1_700_000_000;

    fn setup() -> (Ledger, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let ledger = Ledger::new(
            LedgerConfig::default(),
            Arc::new(Ed25519Verifier),
            clock.clone(),
        );
        (ledger, clock)
    }

    fn star(n: u32) -> Star {
        Star::new(format!("{n}h 0m 0s"), "10° 0' 0", format!("star number {n}"))
    }

    fn claim(ledger: &Ledger, keypair: &Keypair, n: u32) -> Result<Block> {
        let address = keypair.address();
        let message = ledger.request_challenge(&address);
        let signature = keypair.sign_message(&message).encode();
        ledger.submit(&address, &message, &signature, star(n))
    }

    #[test]
    fn test_new_ledger_has_genesis() {
        let (ledger, _) = setup();
        let genesis = ledger.block_by_height(0).unwrap();

        assert_eq!(ledger.height(), 0);
        assert!(genesis.is_genesis());
        assert_eq!(genesis.previous_hash, Hash::ZERO);
        assert_eq!(genesis.timestamp, START);
        assert!(ledger.validate().is_empty());
    }

    #[test]
    fn test_pinned_genesis_timestamp() {
        let config = LedgerConfig {
            genesis_timestamp: Some(1),
            ..LedgerConfig::default()
        };
        let verifier = Arc::new(Ed25519Verifier);
        let a = Ledger::new(config.clone(), verifier.clone(), Arc::new(ManualClock::new(5)));
        let b = Ledger::new(config, verifier, Arc::new(ManualClock::new(9)));
        assert_eq!(a.latest_block().hash, b.latest_block().hash);
    }

    #[test]
    fn test_append_links_to_tail() {
        let (ledger, clock) = setup();
        let genesis = ledger.latest_block();

        clock.advance(10);
        let block = ledger
            .append(Draft::star_claim(Address::ZERO, star(1).encode()))
            .unwrap();

        assert_eq!(block.height, 1);
        assert_eq!(block.previous_hash, genesis.hash);
        assert_eq!(block.timestamp, START + 10);
        assert_eq!(ledger.height(), 1);
        assert_eq!(ledger.latest_block(), block);
    }

    #[test]
    fn test_submit_appends_claim() {
        let (ledger, _) = setup();
        let keypair = Keypair::generate();

        let block = claim(&ledger, &keypair, 1).unwrap();

        assert_eq!(ledger.height(), 1);
        assert_eq!(block.address(), Some(&keypair.address()));
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_signature_from_wrong_wallet_rejected() {
        let (ledger, _) = setup();
        let owner = Keypair::generate();
        let other = Keypair::generate();
        let message = ledger.request_challenge(&owner.address());
        let signature = other.sign_message(&message).encode();

        let result = ledger.submit(&owner.address(), &message, &signature, star(1));

        assert_eq!(result, Err(LedgerError::InvalidSignature));
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn test_challenge_for_other_address_rejected() {
        let (ledger, _) = setup();
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let message = ledger.request_challenge(&bob.address());
        let signature = alice.sign_message(&message).encode();

        let result = ledger.submit(&alice.address(), &message, &signature, star(1));

        assert_eq!(
            result,
            Err(LedgerError::AddressMismatch {
                expected: alice.address(),
                found: bob.address(),
            })
        );
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn test_malformed_challenge_rejected() {
        let (ledger, _) = setup();
        let keypair = Keypair::generate();
        let signature = keypair.sign_message("hello").encode();

        let result = ledger.submit(&keypair.address(), "hello", &signature, star(1));

        assert!(matches!(result, Err(LedgerError::MalformedChallenge(_))));
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn test_invalid_star_rejected_after_signature() {
        let (ledger, _) = setup();
        let keypair = Keypair::generate();
        let message = ledger.request_challenge(&keypair.address());
        let signature = keypair.sign_message(&message).encode();

        let result = ledger.submit(
            &keypair.address(),
            &message,
            &signature,
            Star::new("", "1d", "no ra"),
        );

        assert_eq!(
            result,
            Err(LedgerError::InvalidStar(StarError::MissingCoordinates))
        );
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn test_custom_window() {
        let clock = Arc::new(ManualClock::new(START));
        let config = LedgerConfig {
            challenge_window_secs: 10,
            ..LedgerConfig::default()
        };
        let ledger = Ledger::new(config, Arc::new(Ed25519Verifier), clock.clone());
        let keypair = Keypair::generate();
        let message = ledger.request_challenge(&keypair.address());
        let signature = keypair.sign_message(&message).encode();

        clock.advance(11);
        let result = ledger.submit(&keypair.address(), &message, &signature, star(1));
        assert_eq!(
            result,
            Err(LedgerError::ExpiredChallenge {
                issued_at: START,
                now: START + 11,
            })
        );
    }

    #[test]
    fn test_block_by_hash() {
        let (ledger, _) = setup();
        let keypair = Keypair::generate();
        let block = claim(&ledger, &keypair, 1).unwrap();

        assert_eq!(ledger.block_by_hash(&block.hash), Some(block));
        assert_eq!(ledger.block_by_hash(&Hash::from_bytes([9u8; 32])), None);
    }

    #[test]
    fn test_ranges_and_recent() {
        let (ledger, _) = setup();
        let keypair = Keypair::generate();
        for n in 1..=4 {
            claim(&ledger, &keypair, n).unwrap();
        }

        let heights = |blocks: Vec<Block>| blocks.iter().map(|b| b.height).collect::<Vec<_>>();
        assert_eq!(heights(ledger.blocks_range(1, 3)), vec![1, 2, 3]);
        assert_eq!(heights(ledger.blocks_range(3, 100)), vec![3, 4]);
        assert!(ledger.blocks_range(5, 9).is_empty());
        assert_eq!(heights(ledger.recent_blocks(2)), vec![4, 3]);
        assert_eq!(heights(ledger.recent_blocks(50)).len(), 5);
    }

    #[test]
    fn test_stats() {
        let (ledger, _) = setup();
        let keypair = Keypair::generate();
        claim(&ledger, &keypair, 1).unwrap();
        let latest = claim(&ledger, &keypair, 2).unwrap();

        let stats = ledger.stats();
        assert_eq!(stats.height, 2);
        assert_eq!(stats.star_count, 2);
        assert_eq!(stats.latest_hash, latest.hash);
    }

    #[test]
    fn test_validate_block() {
        let (ledger, _) = setup();
        let keypair = Keypair::generate();
        claim(&ledger, &keypair, 1).unwrap();

        assert_eq!(ledger.validate_block(0), Some(vec![]));
        assert_eq!(ledger.validate_block(1), Some(vec![]));
        assert_eq!(ledger.validate_block(2), None);
    }

    #[test]
    fn test_snapshot_restore() {
        let (ledger, clock) = setup();
        let keypair = Keypair::generate();
        claim(&ledger, &keypair, 1).unwrap();

        let restored = Ledger::from_blocks(
            ledger.snapshot(),
            LedgerConfig::default(),
            Arc::new(Ed25519Verifier),
            clock,
        )
        .unwrap();

        assert_eq!(restored.height(), 1);
        assert_eq!(restored.snapshot(), ledger.snapshot());
        assert!(restored.is_valid());
    }

    #[test]
    fn test_bad_snapshots_rejected() {
        let (ledger, clock) = setup();
        let keypair = Keypair::generate();
        claim(&ledger, &keypair, 1).unwrap();
        claim(&ledger, &keypair, 2).unwrap();

        let restore = |blocks: Vec<Block>| {
            Ledger::from_blocks(
                blocks,
                LedgerConfig::default(),
                Arc::new(Ed25519Verifier),
                clock.clone(),
            )
        };

        assert!(matches!(restore(vec![]), Err(LedgerError::InvalidSnapshot(_))));

        let mut without_genesis = ledger.snapshot();
        without_genesis.remove(0);
        assert!(matches!(
            restore(without_genesis),
            Err(LedgerError::InvalidSnapshot(_))
        ));

        let mut gap = ledger.snapshot();
        gap.remove(1);
        assert!(matches!(restore(gap), Err(LedgerError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_append_rejects_second_genesis() {
        let (ledger, _) = setup();

        assert_eq!(ledger.append(Draft::genesis()), Err(LedgerError::GenesisPayload));
        assert_eq!(ledger.height(), 0);

        let genesis_blocks = ledger
            .snapshot()
            .iter()
            .filter(|block| block.payload == Payload::Genesis)
            .count();
        assert_eq!(genesis_blocks, 1);
    }

    #[test]
    fn test_snapshot_with_second_genesis_rejected() {
        let (ledger, clock) = setup();
        let keypair = Keypair::generate();
        claim(&ledger, &keypair, 1).unwrap();

        let mut blocks = ledger.snapshot();
        let tail = blocks[1].hash;
        blocks.push(Block::seal(Draft::genesis(), 2, tail, START));

        let restored = Ledger::from_blocks(
            blocks,
            LedgerConfig::default(),
            Arc::new(Ed25519Verifier),
            clock,
        );
        match restored {
            Err(LedgerError::InvalidSnapshot(reason)) => assert!(reason.contains("height 2")),
            other => panic!("expected InvalidSnapshot, got {:?}", other.map(|l| l.height())),
        }
    }

    #[test]
    fn test_star_record_json() {
        let (ledger, _) = setup();
        let keypair = Keypair::generate();
        claim(&ledger, &keypair, 7).unwrap();

        let records = ledger.stars_by_address(&keypair.address()).unwrap();
        let json = serde_json::to_value(&records).unwrap();

        assert_eq!(json[0]["height"], 1);
        assert_eq!(json[0]["star"]["story"], "star number 7");
        assert!(json[0]["star"].get("mag").is_none());
    }
}
