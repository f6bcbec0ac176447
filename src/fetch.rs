//! HTTP access used by the asset inliner.
//!
//! The inliner only needs a blocking `get`, so the transport sits behind the
//! small [`AssetFetcher`] trait. [`HttpFetcher`] is the production
//! implementation on top of `reqwest::blocking`.

use crate::{Error, Result};
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Raw response of one asset request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    /// HTTP status code
    pub status: u16,
    /// Response body bytes
    pub body: Vec<u8>,
}

impl FetchedAsset {
    /// Only a plain 200 counts as success; redirects are followed by the client.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Something that can perform a blocking HTTP GET.
pub trait AssetFetcher {
    /// Fetch `url` with the given request headers, giving up after `timeout`.
    fn get(&self, url: &str, headers: &HashMap<String, String>, timeout: Duration)
        -> Result<FetchedAsset>;
}

/// `reqwest`-backed fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build().map_err(|e| {
            Error::InitializationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }
}

impl AssetFetcher for HttpFetcher {
    fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<FetchedAsset> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().map_err(|e| Error::AssetFetch {
            url: url.to_string(),
            reason: if e.is_timeout() {
                format!("timed out after {}ms", timeout.as_millis())
            } else {
                e.to_string()
            },
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| Error::AssetFetch {
            url: url.to_string(),
            reason: format!("failed to read response body: {}", e),
        })?;

        Ok(FetchedAsset {
            status,
            body: body.to_vec(),
        })
    }
}
