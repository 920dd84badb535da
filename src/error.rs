//! Error taxonomy for the collection pipeline.
//!
//! Errors fall into two groups:
//!
//! - **Fatal to a source**: [`Error::StorageCorrupt`], [`Error::StorageRead`],
//!   [`Error::StorageWrite`], [`Error::Listing`]. The orchestrator logs them and counts the source as
//!   having produced nothing for this run.
//! - **Soft**: [`Error::ContentFetch`] and [`Error::Summarization`]. These never
//!   leave the resolver or the summary gate; they are logged and turned into
//!   an empty string there.
//!
//! [`Error::ExportWrite`] only affects the final CSV snapshot, and
//! [`Error::Config`] stops the process before any source runs.

use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store file exists but does not hold a JSON array of items.
    #[error("store {} is corrupt: {source}", .path.display())]
    StorageCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The store file exists but could not be read.
    #[error("store {} could not be read: {source}", .path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file could not be written.
    #[error("store {} could not be written: {source}", .path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network, HTTP status, or document decoding failure for one link.
    #[error("failed to fetch {link}: {reason}")]
    ContentFetch { link: String, reason: String },

    /// The external summarization call failed.
    #[error("summarization failed: {0}")]
    Summarization(String),

    /// A source could not produce its candidate list.
    #[error("listing {url} failed: {reason}")]
    Listing { url: String, reason: String },

    /// The CSV export could not be written.
    #[error("export to {} failed: {reason}", .path.display())]
    ExportWrite { path: PathBuf, reason: String },

    /// Invalid or unreadable startup configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn fetch(link: &str, reason: impl ToString) -> Self {
        Error::ContentFetch {
            link: link.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn listing(url: &str, reason: impl ToString) -> Self {
        Error::Listing {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
