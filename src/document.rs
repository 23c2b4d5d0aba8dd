//! HTML documents and the images they reference.

use anyhow::{Context, Result};
use scraper::{ElementRef, Html};
use std::path::Path;
use url::Url;

use crate::fetch::{HttpFetcher, RetrievalFailure};

/// One `<img>` element of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// 0-based position among the document's images, in document order.
    pub index: usize,
    /// The `src` attribute with surrounding whitespace removed; empty when absent.
    pub src: String,
    resolved: Result<Url, url::ParseError>,
}

impl ImageReference {
    /// The absolute URL `src` resolves to, as a browser computes `img.src`.
    ///
    /// A missing or blank `src` is a failure here, whereas a browser would
    /// resolve it to the page URL and fetch the page itself.
    pub fn resolve(&self) -> Result<&Url, RetrievalFailure> {
        if self.src.is_empty() {
            return Err(RetrievalFailure::MissingSource);
        }
        self.resolved
            .as_ref()
            .map_err(|&source| RetrievalFailure::InvalidUrl {
                src: self.src.clone(),
                source,
            })
    }

    pub fn url(&self) -> Option<&Url> {
        self.resolve().ok()
    }
}

/// A parsed HTML document together with the URL it was loaded from.
pub struct Document {
    url: Url,
    html: Html,
}

impl Document {
    /// Parse `html` as if it had been loaded from `url`.
    pub fn parse(html: &str, url: Url) -> Self {
        Self {
            url,
            html: Html::parse_document(html),
        }
    }

    /// Load a document from an HTTP(S) URL or a local file path.
    pub async fn load(source: &str, http: &HttpFetcher) -> Result<Self> {
        if is_http_url(source) {
            let url = Url::parse(source).with_context(|| format!("invalid URL: {}", source))?;
            let (final_url, body) = http.fetch_page(&url).await?;
            tracing::debug!(url = %final_url, bytes = body.len(), "loaded page");
            return Ok(Self::parse(&body, final_url));
        }

        let path = Path::new(source);
        let body = tokio::fs::read(path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?;
        let path = tokio::fs::canonicalize(path).await?;
        let url = Url::from_file_path(&path)
            .map_err(|()| anyhow::anyhow!("cannot build a file URL for {}", path.display()))?;

        tracing::debug!(url = %url, bytes = body.len(), "loaded page");
        Ok(Self::parse(&String::from_utf8_lossy(&body), url))
    }

    /// The URL the document was loaded from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL relative references resolve against: the first
    /// `<base href>` if there is one, otherwise the document URL.
    pub fn base_url(&self) -> Url {
        self.elements("base")
            .find_map(|base| base.value().attr("href"))
            .and_then(|href| self.url.join(href.trim()).ok())
            .unwrap_or_else(|| self.url.clone())
    }

    /// Every `<img>` element, in document order.
    pub fn images(&self) -> Vec<ImageReference> {
        let base = self.base_url();

        self.elements("img")
            .enumerate()
            .map(|(index, img)| {
                let src = img.value().attr("src").unwrap_or("").trim().to_string();
                let resolved = base.join(&src);
                ImageReference {
                    index,
                    src,
                    resolved,
                }
            })
            .collect()
    }

    /// Elements with the given local name, in document (pre-)order.
    ///
    /// `<template>` contents are inert and not part of the document, so
    /// nothing below a template is returned.
    fn elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(move |element| element.value().name() == name)
            .filter(|element| !in_template(element))
    }
}

fn in_template(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "template")
}

pub fn is_http_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
