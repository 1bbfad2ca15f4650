//! Error types for batch caching and spill.

use arrow::error::ArrowError;
use thiserror::Error;

/// Errors surfaced by cache machines and tiered batches.
///
/// Stream end is not an error: pull operations return `Ok(None)` once a
/// finished queue has been drained.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No configured tier had headroom for the batch.
    #[error("No tier has headroom for {requested} bytes ({tiers})")]
    OutOfSpace { requested: u64, tiers: String },

    /// Spill file could not be written, read, or removed.
    #[error("Spill storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Batch could not be serialized or deserialized.
    #[error("Batch serialization error: {0}")]
    Arrow(#[from] ArrowError),

    /// An internal invariant was broken.
    #[error("Internal cache error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true for resource exhaustion across all tiers.
    pub fn is_out_of_space(&self) -> bool {
        matches!(self, Self::OutOfSpace { .. })
    }

    /// Returns true for failures of the spill storage.
    ///
    /// Arrow I/O errors raised while streaming a spill file count as storage
    /// failures too.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Arrow(ArrowError::IoError(..)))
    }
}
