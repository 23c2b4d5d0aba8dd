use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

use super::{Fetch, FetchOptions, FetchedResource, RetrievalFailure, essence};

/// HTTP(S) fetcher backed by a shared `reqwest` client
pub struct HttpFetcher {
    client: Client,
    transferred_bytes: AtomicU64,
}

impl HttpFetcher {
    pub fn new(options: &FetchOptions) -> Result<Self> {
        let mut builder = Client::builder().user_agent(options.user_agent.as_str());
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Fetch an HTML page.
    ///
    /// Returns the final URL after redirects, which is what relative image
    /// sources resolve against, together with the body decoded as UTF-8.
    pub async fn fetch_page(&self, url: &Url) -> Result<(Url, String)> {
        let resp = self.client.get(url.clone()).send().await?;

        if !resp.status().is_success() {
            bail!("HTTP request for {} failed with status: {}", url, resp.status());
        }

        let final_url = resp.url().clone();
        let body = resp.bytes().await?;
        self.transferred_bytes
            .fetch_add(body.len() as u64, Ordering::Relaxed);

        Ok((final_url, String::from_utf8_lossy(&body).into_owned()))
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, RetrievalFailure> {
        let resp = self.client.get(url.clone()).send().await?;

        if !resp.status().is_success() {
            return Err(RetrievalFailure::Status(resp.status()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(essence);

        let bytes = resp.bytes().await?;
        self.transferred_bytes
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);

        Ok(FetchedResource {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
