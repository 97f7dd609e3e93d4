//! Error surface shared across the card data layer.

use thiserror::Error;

/// Failures produced while acquiring, caching, or materializing card data.
///
/// Every operation returns this type instead of terminating the process; the
/// hosting surface decides what a failure means for the user.
#[derive(Debug, Error)]
pub enum CardError {
    /// Transport-level HTTP failure (connect, TLS, body read, decode).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream API answered with a non-success status.
    #[error("card API returned status {status}")]
    Api { status: u16 },

    /// Filesystem failure while reading or writing the snapshot.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The snapshot file exists but could not be decoded.
    #[error("snapshot unreadable: {0}")]
    Snapshot(String),

    /// SQLite-level failure while materializing or querying the card table.
    #[error("storage error: {0}")]
    Storage(String),

    /// SQL that the read-only query surface refuses to run.
    #[error("rejected SQL: {0}")]
    Query(String),
}
