//! Errors returned by session operations.

use spacemap_core::ScanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// No path was given to scan.
    #[error("Missing path")]
    MissingPath,

    /// The scan itself failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The id is outside the current index, names an empty slot, or no
    /// scan has completed yet.
    #[error("Invalid node id: {0}")]
    InvalidNodeId(u64),

    /// Layout viewports must be strictly positive.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
}
