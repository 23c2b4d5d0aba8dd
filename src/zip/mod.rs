//! ZIP archive encoding and reading.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`writer`]: [`ArchiveBuilder`], which collects entries and encodes the archive
//! - [`parser`]: [`ArchiveReader`], which lists and decompresses entries of an archive in memory
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Limitations
//!
//! - No ZIP64: entries and the whole archive must stay below 4 GiB,
//!   and an archive holds at most 65535 entries
//! - STORED and DEFLATE only
//! - No encryption, no multi-disk archives

mod parser;
mod structures;
mod writer;

pub use parser::ArchiveReader;
pub use structures::*;
pub use writer::{ArchiveBlob, ArchiveBuilder, DEFAULT_LEVEL};

use thiserror::Error;

/// Errors from building or reading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("duplicate archive entry: {0}")]
    DuplicateEntry(String),
    #[error("invalid archive entry name: {0:?}")]
    InvalidName(String),
    #[error("entry {name} is {size} bytes, larger than ZIP allows without ZIP64")]
    EntryTooLarge { name: String, size: u64 },
    #[error("archive would exceed 4 GiB")]
    ArchiveTooLarge,
    #[error("archive would hold more than 65535 entries")]
    TooManyEntries,
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),
    #[error("invalid ZIP archive: {0}")]
    Invalid(&'static str),
    #[error("CRC or size mismatch in entry {0}")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
