//! HTTP resource loader
//!
//! Stands in for a document engine's fetcher: every request runs as a tokio
//! task, and the returned handle can be awaited or aborted.

use std::time::Duration;

use reqwest::header::{ACCEPT, REFERER};
use reqwest::{Client, Url};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use lg_core::ResourceLoader;

/// Per-request options passed through the policy filter.
#[derive(Debug, Clone, Default)]
pub struct HttpFetchOptions {
    pub referrer: Option<String>,
    pub accept: Option<String>,
}

/// A running fetch. Dropping it detaches the task; `abort()` cancels it.
pub type PendingFetch = JoinHandle<Result<Vec<u8>, reqwest::Error>>;

pub struct HttpLoader {
    client: Client,
    runtime: Handle,
}

impl HttpLoader {
    pub fn new(runtime: Handle) -> Self {
        Self {
            client: Client::new(),
            runtime,
        }
    }
}

impl ResourceLoader for HttpLoader {
    type Options = HttpFetchOptions;
    type Resource = PendingFetch;

    fn fetch(&self, url: &str, options: &HttpFetchOptions) -> Option<PendingFetch> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("declining '{url}': {e}");
                return None;
            }
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            log::warn!("declining '{url}': unsupported scheme '{}'", parsed.scheme());
            return None;
        }

        let mut request = self.client.get(parsed);
        if let Some(referrer) = &options.referrer {
            request = request.header(REFERER, referrer.as_str());
        }
        if let Some(accept) = &options.accept {
            request = request.header(ACCEPT, accept.as_str());
        }

        Some(self.runtime.spawn(async move {
            let response = request.send().await?.error_for_status()?;
            Ok::<_, reqwest::Error>(response.bytes().await?.to_vec())
        }))
    }
}

/// Wait for a fetch, aborting it once `timeout` has passed.
pub async fn wait_with_timeout(mut pending: PendingFetch, timeout: Duration) -> Result<Vec<u8>, String> {
    match tokio::time::timeout(timeout, &mut pending).await {
        Ok(Ok(Ok(body))) => Ok(body),
        Ok(Ok(Err(e))) => Err(format!("request failed: {}", e)),
        Ok(Err(e)) => Err(format!("fetch task failed: {}", e)),
        Err(_) => {
            pending.abort();
            Err(format!("timed out after {:.1}s", timeout.as_secs_f64()))
        }
    }
}
