//! Error types for the store layer.

use std::path::PathBuf;

/// Errors that can occur while persisting room state.
///
/// Read problems never show up here: an unreadable or malformed document
/// is backed up and replaced by the rooms that could be recovered. What remains are write failures, which
/// fail the operation that tried to commit.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file could not be written or moved into place.
    #[error("store I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be serialized.
    #[error("snapshot encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The backend refused the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
