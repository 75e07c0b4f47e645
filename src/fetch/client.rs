//! HTTP client seam.
//!
//! The batch fetcher only needs "GET this URL, give me status and body", so it
//! talks to an [`HttpGet`] trait object. [`ReqwestClient`] is the production
//! implementation; tests plug in fakes.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;

use crate::errors::FetchError;

const USER_AGENT: &str = concat!("relocate/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Status code and full body of a GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpGet: Send + Sync {
    /// Perform a GET. Transport failures are errors; any HTTP status is `Ok`.
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// reqwest-backed [`HttpGet`] with a per-request timeout.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::ClientSetup(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpGet for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        trace!(url, status = status.as_u16(), "response headers received");
        if !status.is_success() {
            // Error bodies are not kept.
            return Ok(HttpResponse {
                status: status.as_u16(),
                body: Vec::new(),
            });
        }
        let body = response.bytes().await.map_err(transport)?;
        Ok(HttpResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
