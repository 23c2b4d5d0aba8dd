//! Retrieval of image bytes by URL.
//!
//! [`Fetch`] is the seam between the exporter and the outside world.
//! [`SchemeFetcher`] is what the binary uses: it routes `http`/`https` URLs
//! to [`HttpFetcher`] and `file` URLs to [`LocalFetcher`].

mod error;
mod http;
mod local;

pub use error::RetrievalFailure;
pub use http::HttpFetcher;
pub use local::LocalFetcher;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Bytes retrieved for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    pub bytes: Vec<u8>,
    /// Media type reported by the source, without parameters.
    pub content_type: Option<String>,
}

/// Trait for retrieving the content behind a URL
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Retrieve the full content of `url`.
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, RetrievalFailure>;
}

#[async_trait]
impl<F: Fetch + ?Sized> Fetch for Arc<F> {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, RetrievalFailure> {
        (**self).fetch(url).await
    }
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout. `None` waits as long as the server keeps the
    /// connection open.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Dispatches on the URL scheme.
pub struct SchemeFetcher {
    http: HttpFetcher,
    local: LocalFetcher,
}

impl SchemeFetcher {
    pub fn new(options: &FetchOptions) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpFetcher::new(options)?,
            local: LocalFetcher,
        })
    }

    pub fn http(&self) -> &HttpFetcher {
        &self.http
    }
}

#[async_trait]
impl Fetch for SchemeFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, RetrievalFailure> {
        match url.scheme() {
            "http" | "https" => self.http.fetch(url).await,
            "file" => self.local.fetch(url).await,
            other => Err(RetrievalFailure::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Strip parameters from a media type: `image/png; q=1` → `image/png`.
pub(crate) fn essence(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    (!essence.is_empty()).then_some(essence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_schemes_fail_without_io() {
        let fetcher = SchemeFetcher::new(&FetchOptions::default()).unwrap();
        let url = Url::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, RetrievalFailure::UnsupportedScheme(s) if s == "data"));
    }

    #[test]
    fn essence_drops_parameters() {
        assert_eq!(essence("Image/PNG; charset=binary").as_deref(), Some("image/png"));
        assert_eq!(essence(" ; x=y"), None);
    }
}
