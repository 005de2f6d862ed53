//! HTTP retrieval of source front pages.
//!
//! One attempt per source per run: a failure is logged by the caller and the
//! next scheduled run acts as the retry.

use reqwest::Client;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, instrument};

use crate::config::FetchSettings;
use crate::error::FetchError;

/// A fetched page body and the URL it was requested from.
///
/// Parsing into a DOM is left to the extractor so that no non-`Send` tree
/// is held across an `.await`.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub body: String,
}

/// Something that can retrieve a page by URL.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Page, FetchError>> + Send;
}

/// [`Fetch`] over `reqwest` with a fixed timeout and browser-like user agent.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.timeout())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Fetch for PageFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(Page {
            url: url.to_string(),
            body,
        })
    }
}

/// Canned fetcher for orchestrator and endpoint tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// Serves bodies by exact URL; anything else answers 503.
    #[derive(Debug, Default)]
    pub struct StubFetcher {
        pages: HashMap<String, String>,
    }

    impl StubFetcher {
        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl Fetch for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
            match self.pages.get(url) {
                Some(body) => Ok(Page {
                    url: url.to_string(),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                }),
            }
        }
    }
}
