use async_trait::async_trait;
use std::path::Path;
use url::Url;

use super::{Fetch, FetchedResource, RetrievalFailure};

/// Reads `file://` URLs from the local filesystem
pub struct LocalFetcher;

#[async_trait]
impl Fetch for LocalFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, RetrievalFailure> {
        let path = url
            .to_file_path()
            .map_err(|()| RetrievalFailure::NotAFilePath(url.to_string()))?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| RetrievalFailure::Io {
                path: path.clone(),
                source,
            })?;

        Ok(FetchedResource {
            bytes,
            content_type: content_type_for_path(&path).map(str::to_string),
        })
    }
}

/// Media type implied by a file extension. Local files carry no headers,
/// so this stands in for `Content-Type`.
fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(mime)
}
