use std::path::PathBuf;
use thiserror::Error;

use crate::zip::ArchiveError;

/// Why a single image could not be retrieved.
///
/// A failure only ever affects the image it belongs to.
#[derive(Debug, Error)]
pub enum RetrievalFailure {
    #[error("image has no src")]
    MissingSource,
    #[error("cannot resolve src {src:?}: {source}")]
    InvalidUrl {
        src: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("not a local file URL: {0}")]
    NotAFilePath(String),
    #[error("HTTP request failed with status: {0}")]
    Status(reqwest::StatusCode),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("cannot add image to archive: {0}")]
    Archive(#[from] ArchiveError),
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
