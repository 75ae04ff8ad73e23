//! Whole-chain consistency checks.

use serde::Serialize;
use starchain_core::Block;
use std::fmt;

/// An inconsistency found while scanning the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationIssue {
    /// The stored hash does not match the hash recomputed from the block's fields.
    TamperedBlock { height: u64 },
    /// The block's previous hash does not match the stored hash of its predecessor.
    BrokenLink { height: u64 },
}

impl ValidationIssue {
    pub fn height(&self) -> u64 {
        match self {
            ValidationIssue::TamperedBlock { height } | ValidationIssue::BrokenLink { height } => {
                *height
            }
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::TamperedBlock { height } => {
                write!(f, "block {height}: hash does not match contents")
            }
            ValidationIssue::BrokenLink { height } => write!(
                f,
                "block {height}: previous hash does not match block {}",
                height.saturating_sub(1)
            ),
        }
    }
}

/// Check one block against its predecessor (`None` for genesis).
pub fn check_block(block: &Block, previous: Option<&Block>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if !block.has_valid_hash() {
        issues.push(ValidationIssue::TamperedBlock {
            height: block.height,
        });
    }

    if let Some(previous) = previous {
        if block.previous_hash != previous.hash {
            issues.push(ValidationIssue::BrokenLink {
                height: block.height,
            });
        }
    }

    issues
}

/// Scan every block once, in height order, collecting all issues.
pub fn validate_chain(blocks: &[Block]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut previous = None;
    for block in blocks {
        issues.extend(check_block(block, previous));
        previous = Some(block);
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use starchain_core::{Address, Draft, Hash, Payload, Star};

    fn chain(len: u64) -> Vec<Block> {
        let mut blocks = vec![Block::seal(Draft::genesis(), 0, Hash::ZERO, 100)];
        for height in 1..len {
            let star = Star::new(format!("{height}h"), "0d", "s").encode();
            let prev = blocks[blocks.len() - 1].hash;
            blocks.push(Block::seal(
                Draft::star_claim(Address::ZERO, star),
                height,
                prev,
                100 + height,
            ));
        }
        blocks
    }

    #[test]
    fn test_clean_chain() {
        assert!(validate_chain(&chain(5)).is_empty());
    }

    #[test]
    fn test_payload_edit_is_tampering() {
        let mut blocks = chain(4);
        blocks[2].payload = Payload::Genesis;

        assert_eq!(
            validate_chain(&blocks),
            vec![ValidationIssue::TamperedBlock { height: 2 }]
        );
    }

    #[test]
    fn test_rehashed_edit_breaks_next_link() {
        let mut blocks = chain(4);
        blocks[1].timestamp = 1;
        blocks[1].hash = blocks[1].compute_hash();

        assert_eq!(
            validate_chain(&blocks),
            vec![ValidationIssue::BrokenLink { height: 2 }]
        );
    }

    #[test]
    fn test_hash_edit_reports_both_sides() {
        let mut blocks = chain(4);
        blocks[1].hash = Hash::from_bytes([7u8; 32]);

        assert_eq!(
            validate_chain(&blocks),
            vec![
                ValidationIssue::TamperedBlock { height: 1 },
                ValidationIssue::BrokenLink { height: 2 },
            ]
        );
    }

    #[test]
    fn test_scan_does_not_stop_at_first_issue() {
        let mut blocks = chain(6);
        blocks[1].payload = Payload::Genesis;
        blocks[4].payload = Payload::Genesis;

        let heights: Vec<u64> = validate_chain(&blocks).iter().map(|i| i.height()).collect();
        assert_eq!(heights, vec![1, 4]);
    }

    #[test]
    fn test_tail_block_is_checked() {
        let mut blocks = chain(3);
        blocks[2].timestamp += 1;
        assert_eq!(
            validate_chain(&blocks),
            vec![ValidationIssue::TamperedBlock { height: 2 }]
        );
    }
}
