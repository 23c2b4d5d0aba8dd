//! # imgzip
//!
//! Collect every image referenced by an HTML page into a single ZIP archive.
//!
//! The page is loaded from a local file or an HTTP(S) URL. Every `<img>`
//! element is fetched concurrently, and the images that could be retrieved
//! are stored as `images/image1.jpg`, `images/image2.jpg`, ... in document
//! order. Images that fail to download are logged and skipped; their
//! numbers are left unused so the remaining names stay stable.
//!
//! ## Features
//!
//! - Local HTML files (relative images are read from disk) and HTTP/HTTPS pages
//! - `<base href>` aware URL resolution
//! - Per-image failure isolation with a report of what was skipped
//! - DEFLATE or STORED entries, written by a built-in ZIP encoder
//! - Optional extension inference from the response content type
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use imgzip::{DirectorySink, Document, ExportOptions, FetchOptions, ImageZipExporter, SchemeFetcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fetcher = Arc::new(SchemeFetcher::new(&FetchOptions::default())?);
//!     let document = Document::load("https://example.com/gallery", fetcher.http()).await?;
//!
//!     let exporter = ImageZipExporter::new(fetcher.clone(), ExportOptions::default());
//!     let report = exporter
//!         .export_and_save(&document, &DirectorySink::new("."))
//!         .await?;
//!
//!     println!("{} images saved, {} failed", report.archived.len(), report.failed.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod document;
pub mod export;
pub mod fetch;
pub mod logging;
pub mod zip;

pub use cli::Cli;
pub use document::{Document, ImageReference};
pub use export::{
    ArchiveSink, DirectorySink, EntryNaming, ExportOptions, ExportReport, ImageZipExporter,
    StdoutSink,
};
pub use fetch::{Fetch, FetchOptions, FetchedResource, HttpFetcher, LocalFetcher, RetrievalFailure, SchemeFetcher};
pub use zip::{ArchiveBlob, ArchiveBuilder, ArchiveReader, ZipFileEntry};
