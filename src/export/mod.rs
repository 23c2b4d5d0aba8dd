//! Collect a document's images into one ZIP archive.
//!
//! The export runs in three steps:
//!
//! 1. Every `<img>` of the document is retrieved. All retrievals are polled
//!    together on the calling task and joined once; none waits on another.
//! 2. Successful retrievals become entries `<folder>/image<N>.jpg`, where `N`
//!    is the image's 1-based position in the document. A failed retrieval, or
//!    an image the archive cannot hold, is logged and leaves a gap in the
//!    numbering; it never fails the export.
//! 3. The archive is encoded on a blocking thread and handed to an
//!    [`ArchiveSink`].
//!
//! Failures while encoding or saving the archive do fail the export.

mod naming;
mod sink;

pub use naming::{DEFAULT_EXTENSION, EntryNaming};
pub use sink::{ArchiveSink, DirectorySink, StdoutSink, write_archive};

use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use url::Url;

use crate::document::{Document, ImageReference};
use crate::fetch::{Fetch, FetchedResource, RetrievalFailure};
use crate::zip::{ArchiveBlob, ArchiveBuilder, CompressionMethod, DEFAULT_LEVEL};

/// Folder inside the archive that holds the images.
pub const DEFAULT_FOLDER: &str = "images";

/// File name the archive is saved under.
pub const DEFAULT_ARCHIVE_NAME: &str = "images.zip";

/// Largest image a ZIP entry can hold without ZIP64.
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = u32::MAX as u64;

/// What the archive looks like and what it is called.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Folder for the entries; empty puts them at the archive root.
    pub folder: String,
    pub archive_name: String,
    pub naming: EntryNaming,
    pub compression: CompressionMethod,
    pub level: u32,
    /// Images above this many bytes are left out of the archive.
    pub max_image_size: u64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            folder: DEFAULT_FOLDER.to_string(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            naming: EntryNaming::Fixed,
            compression: CompressionMethod::Deflate,
            level: DEFAULT_LEVEL,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
        }
    }
}

impl ExportOptions {
    fn folder(&self) -> &str {
        self.folder.trim_matches('/')
    }

    fn entry_path(&self, file_name: &str) -> String {
        match self.folder() {
            "" => file_name.to_string(),
            folder => format!("{}/{}", folder, file_name),
        }
    }
}

/// An image that made it into the archive.
#[derive(Debug, Clone)]
pub struct ArchivedImage {
    pub index: usize,
    /// Full path of the entry, folder included.
    pub entry_name: String,
    pub url: Url,
    pub size: usize,
    pub content_type: Option<String>,
}

/// An image left out of the archive, and why.
#[derive(Debug)]
pub struct FailedImage {
    pub index: usize,
    pub src: String,
    pub reason: RetrievalFailure,
}

/// Outcome of one export: the archive plus what went into it and what did not.
#[derive(Debug)]
pub struct ExportReport {
    pub archive: ArchiveBlob,
    /// In document order.
    pub archived: Vec<ArchivedImage>,
    /// In document order.
    pub failed: Vec<FailedImage>,
}

impl ExportReport {
    pub fn total(&self) -> usize {
        self.archived.len() + self.failed.len()
    }
}

/// Exports the images of a document as a ZIP archive.
pub struct ImageZipExporter<F: Fetch> {
    fetcher: Arc<F>,
    options: ExportOptions,
}

impl<F: Fetch> ImageZipExporter<F> {
    pub fn new(fetcher: Arc<F>, options: ExportOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Build the archive for every image of `document`.
    ///
    /// The images are enumerated before the returned future is first polled.
    pub fn export(&self, document: &Document) -> impl Future<Output = Result<ExportReport>> + '_ {
        let page = document.url().clone();
        let images = document.images();
        async move { self.export_images(&page, images).await }
    }

    /// Build the archive for `document` and hand it to `sink` under the
    /// configured archive name.
    pub fn export_and_save<'a, S: ArchiveSink + ?Sized>(
        &'a self,
        document: &Document,
        sink: &'a S,
    ) -> impl Future<Output = Result<ExportReport>> + 'a {
        let page = document.url().clone();
        let images = document.images();
        async move {
            let report = self.export_images(&page, images).await?;
            sink.save(&report.archive, &self.options.archive_name).await?;
            Ok(report)
        }
    }

    /// Build the archive for an explicit list of images found on `page`.
    ///
    /// `page` decides what may be fetched: local `file:` images are only
    /// read for a page that is itself a local file.
    pub async fn export_images(
        &self,
        page: &Url,
        images: Vec<ImageReference>,
    ) -> Result<ExportReport> {
        tracing::info!(images = images.len(), "exporting images");

        let outcomes = join_all(images.iter().map(|image| self.retrieve(page, image))).await;

        let mut builder = ArchiveBuilder::with_method(self.options.compression, self.options.level);
        if !self.options.folder().is_empty() {
            builder.add_directory(self.options.folder())?;
        }

        let mut archived = Vec::new();
        let mut failed = Vec::new();

        for (image, outcome) in images.into_iter().zip(outcomes) {
            let outcome = outcome.and_then(|(url, resource)| {
                self.add_image(&mut builder, image.index, url, resource)
            });

            match outcome {
                Ok(entry) => archived.push(entry),
                Err(reason) => {
                    tracing::error!(
                        index = image.index,
                        src = %image.src,
                        error = %reason,
                        "image left out of archive"
                    );
                    failed.push(FailedImage {
                        index: image.index,
                        src: image.src,
                        reason,
                    });
                }
            }
        }

        let archive = tokio::task::spawn_blocking(move || builder.generate()).await??;

        tracing::info!(
            archived = archived.len(),
            failed = failed.len(),
            bytes = archive.len(),
            "archive generated"
        );

        Ok(ExportReport {
            archive,
            archived,
            failed,
        })
    }

    async fn retrieve(
        &self,
        page: &Url,
        image: &ImageReference,
    ) -> Result<(Url, FetchedResource), RetrievalFailure> {
        let url = image.resolve()?;
        if url.scheme() == "file" && page.scheme() != "file" {
            return Err(RetrievalFailure::UnsupportedScheme(url.scheme().to_string()));
        }
        tracing::debug!(index = image.index, url = %url, "fetching image");
        let resource = self.fetcher.fetch(url).await?;
        Ok((url.clone(), resource))
    }

    fn add_image(
        &self,
        builder: &mut ArchiveBuilder,
        index: usize,
        url: Url,
        resource: FetchedResource,
    ) -> Result<ArchivedImage, RetrievalFailure> {
        let size = resource.bytes.len();
        if size as u64 > self.options.max_image_size {
            return Err(RetrievalFailure::TooLarge {
                size: size as u64,
                limit: self.options.max_image_size,
            });
        }

        let file_name = self
            .options
            .naming
            .file_name(index, resource.content_type.as_deref());
        let entry_name = self.options.entry_path(&file_name);
        builder.add_file(&entry_name, resource.bytes)?;

        Ok(ArchivedImage {
            index,
            entry_name,
            url,
            size,
            content_type: resource.content_type,
        })
    }
}
