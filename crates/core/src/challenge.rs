//! Ownership challenges.
//!
//! A challenge binds a wallet address to the second it was issued:
//!
//! ```text
//! 0x<40 hex address>:<unix seconds>:starRegistry
//! ```
//!
//! Nothing is stored between issuance and submission. The timestamp travels
//! inside the message, and the wallet's signature over the whole message
//! stops a caller from rewriting it.

use crate::crypto::Address;
use thiserror::Error;

/// Trailing tag of every challenge message.
pub const CHALLENGE_TAG: &str = "starRegistry";

/// Seconds a challenge stays valid after issuance.
pub const CHALLENGE_WINDOW_SECS: u64 = 300;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("malformed challenge: {0}")]
    Malformed(String),
}

/// Build the challenge message for `address` at `now`.
pub fn issue_challenge(address: &Address, now: u64) -> String {
    format!("{}:{}:{}", address.to_hex(), now, CHALLENGE_TAG)
}

/// A parsed challenge message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    pub address: Address,
    pub issued_at: u64,
}

impl Challenge {
    pub fn parse(message: &str) -> Result<Self, ChallengeError> {
        let mut parts = message.split(':');
        let (Some(address), Some(issued_at), Some(tag), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ChallengeError::Malformed(
                "expected <address>:<timestamp>:<tag>".into(),
            ));
        };

        if tag != CHALLENGE_TAG {
            return Err(ChallengeError::Malformed(format!("unknown tag {tag:?}")));
        }
        let address = Address::from_hex(address)
            .map_err(|_| ChallengeError::Malformed(format!("bad address {address:?}")))?;
        let issued_at = issued_at
            .parse::<u64>()
            .map_err(|_| ChallengeError::Malformed(format!("bad timestamp {issued_at:?}")))?;

        Ok(Self { address, issued_at })
    }

    /// Seconds since issuance. A challenge stamped after `now` has elapsed 0.
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.issued_at)
    }

    /// Expired once strictly more than `window` seconds have passed.
    pub fn is_expired(&self, now: u64, window: u64) -> bool {
        self.elapsed(now) > window
    }

    pub fn message(&self) -> String {
        issue_challenge(&self.address, self.issued_at)
    }
}
