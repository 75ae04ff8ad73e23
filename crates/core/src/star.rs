//! Star records as submitted by owners and as stored on chain.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum story length, in bytes, after validation.
pub const MAX_STORY_BYTES: usize = 500;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StarError {
    #[error("star must have both right ascension and declination")]
    MissingCoordinates,
    #[error("story is {len} bytes, limit is {MAX_STORY_BYTES}")]
    StoryTooLong { len: usize },
    #[error("story must be ASCII text")]
    NonAsciiStory,
    #[error("stored story is not valid hex-encoded text")]
    CorruptStory,
}

/// A star as the owner describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    /// Right ascension, e.g. `16h 29m 1.0s`.
    pub ra: String,
    /// Declination, e.g. `-26° 29' 24.9`.
    pub dec: String,
    /// Magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag: Option<String>,
    /// Constellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cen: Option<String>,
    pub story: String,
}

impl Star {
    pub fn new(ra: impl Into<String>, dec: impl Into<String>, story: impl Into<String>) -> Self {
        Self {
            ra: ra.into(),
            dec: dec.into(),
            mag: None,
            cen: None,
            story: story.into(),
        }
    }

    pub fn with_magnitude(mut self, mag: impl Into<String>) -> Self {
        self.mag = Some(mag.into());
        self
    }

    pub fn with_constellation(mut self, cen: impl Into<String>) -> Self {
        self.cen = Some(cen.into());
        self
    }

    pub fn validate(&self) -> Result<(), StarError> {
        if self.ra.trim().is_empty() || self.dec.trim().is_empty() {
            return Err(StarError::MissingCoordinates);
        }
        if !self.story.is_ascii() {
            return Err(StarError::NonAsciiStory);
        }
        if self.story.len() > MAX_STORY_BYTES {
            return Err(StarError::StoryTooLong {
                len: self.story.len(),
            });
        }
        Ok(())
    }

    /// Convert to the on-chain form.
    pub fn encode(&self) -> EncodedStar {
        EncodedStar {
            ra: self.ra.clone(),
            dec: self.dec.clone(),
            mag: self.mag.clone(),
            cen: self.cen.clone(),
            story_hex: hex::encode(self.story.as_bytes()),
        }
    }
}

/// The on-chain star record. The story is kept hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedStar {
    pub ra: String,
    pub dec: String,
    pub mag: Option<String>,
    pub cen: Option<String>,
    pub story_hex: String,
}

impl EncodedStar {
    pub fn decode(&self) -> Result<Star, StarError> {
        let bytes = hex::decode(&self.story_hex).map_err(|_| StarError::CorruptStory)?;
        let story = String::from_utf8(bytes).map_err(|_| StarError::CorruptStory)?;
        Ok(Star {
            ra: self.ra.clone(),
            dec: self.dec.clone(),
            mag: self.mag.clone(),
            cen: self.cen.clone(),
            story,
        })
    }
}
