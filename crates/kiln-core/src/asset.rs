//! Content identity and asset validation errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stable content identity of a decoded asset.
///
/// Assigned once when mesh or image data is decoded and never changed
/// afterwards. The renderer keys its GPU caches by this value, so two assets
/// with identical bytes but different ids are distinct resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Generates a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identity from a fixed value (for deterministic fixtures).
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Returns the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AssetId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when decoded asset data is inconsistent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssetError {
    #[error("Unsupported channel count: {0} (expected 1-4)")]
    UnsupportedChannels(u32),

    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },

    #[error("Image has zero size ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Attribute '{attribute}' has {actual} entries, expected {expected}")]
    AttributeLengthMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Index count {0} is not a multiple of 3")]
    IncompleteTriangle(usize),
}

/// Result type for asset construction
pub type AssetResult<T> = Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_distinct() {
        assert_ne!(AssetId::new(), AssetId::new());
    }

    #[test]
    fn test_fixed_ids_are_stable() {
        assert_eq!(AssetId::from_u128(7), AssetId::from_u128(7));
        assert_eq!(AssetId::from_u128(7).uuid(), Uuid::from_u128(7));
    }
}
