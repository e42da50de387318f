//! Request Executor
//!
//! This module issues every HTTP request of a run:
//! - Builds one HTTP client per proxy endpoint (or one direct client)
//! - Bounds concurrently open connections with a semaphore
//! - Assigns proxies per attempt, rotating on retry
//! - Classifies failures as transient (retry) or fatal (abandon)
//!
//! The executor never sleeps or retries by itself; it reports the outcome and
//! the driver decides whether to requeue.

use super::frontier::PageRequest;
use super::proxy::ProxyPool;
use crate::config::Config;
use crate::SiftError;
use reqwest::{header, Client, Proxy, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

/// Statuses that signal rate limiting or a temporary server problem
const TRANSIENT_STATUSES: &[u16] = &[408, 425, 429, 500, 502, 503, 504];

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct RawPage {
    /// URL that was requested
    pub url: Url,

    /// HTTP status code
    pub status: u16,

    /// Decoded markup
    pub body: String,
}

/// Why a fetch did not produce a page
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Worth retrying: rate limiting, server hiccup, timeout, refused connection
    #[error("transient failure for {url}: {reason}")]
    Transient {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// Retrying cannot help: missing page, undecodable body, bad request
    #[error("fatal failure for {url}: {reason}")]
    Fatal {
        url: String,
        status: Option<u16>,
        reason: String,
    },
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Transient { status, .. } | FetchError::Fatal { status, .. } => *status,
        }
    }

    fn transient(url: &Url, status: Option<u16>, reason: impl Into<String>) -> Self {
        FetchError::Transient {
            url: url.to_string(),
            status,
            reason: reason.into(),
        }
    }

    fn fatal(url: &Url, status: Option<u16>, reason: impl Into<String>) -> Self {
        FetchError::Fatal {
            url: url.to_string(),
            status,
            reason: reason.into(),
        }
    }
}

/// Builds an HTTP client with the run's user agent and timeout
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `proxy` - Proxy endpoint this client routes through, if any
///
/// # Example
///
/// ```
/// use listing_sift::config::Config;
/// use listing_sift::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default(), None);
/// assert!(client.is_ok());
/// ```
pub fn build_http_client(config: &Config, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.scraper.timeout_secs);

    let mut builder = Client::builder()
        .user_agent(config.http.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true);

    if let Some(endpoint) = proxy {
        builder = builder.proxy(Proxy::all(endpoint)?);
    }

    builder.build()
}

/// Issues page requests under a connection bound and proxy rotation
#[derive(Debug)]
pub struct RequestExecutor {
    /// One client per proxy slot, or a single direct client
    clients: Vec<Client>,
    proxies: ProxyPool,
    connections: Arc<Semaphore>,
}

impl RequestExecutor {
    /// Creates an executor for the run configuration
    pub fn new(config: &Config) -> Result<Self, SiftError> {
        let proxies = ProxyPool::new(config.proxies.pool.clone(), config.proxies.rotate);

        let clients = if proxies.is_empty() {
            vec![build_http_client(config, None)?]
        } else {
            config
                .proxies
                .pool
                .iter()
                .map(|endpoint| {
                    build_http_client(config, Some(endpoint)).map_err(|source| SiftError::Http {
                        url: endpoint.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            clients,
            proxies,
            connections: Arc::new(Semaphore::new(config.scraper.concurrency.max(1) as usize)),
        })
    }

    /// Connections currently available under the concurrency bound
    pub fn available_connections(&self) -> usize {
        self.connections.available_permits()
    }

    /// Fetches one attempt of a request
    ///
    /// Assigns the attempt's proxy slot (recorded in `request.proxy` so a
    /// retry can avoid it) and holds a connection permit until the body has
    /// been read.
    ///
    /// # Classification
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | 2xx with HTML or text body | `RawPage` |
    /// | 408, 425, 429, 500, 502, 503, 504 | Transient |
    /// | Timeout, connection refused, interrupted body | Transient |
    /// | 404 and every other status | Fatal |
    /// | Non-markup content type, undecodable body | Fatal |
    pub async fn fetch(&self, request: &mut PageRequest) -> Result<RawPage, FetchError> {
        let url = request.url.clone();
        request.proxy = self.proxies.assign(request.proxy);
        let client = self.client_for(request.proxy);

        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|_| FetchError::fatal(&url, None, "executor is shut down"))?;

        if let Some(endpoint) = request.proxy.and_then(|slot| self.proxies.endpoint(slot)) {
            tracing::debug!("GET {} (attempt {}, via {})", url, request.attempt, endpoint);
        } else {
            tracing::debug!("GET {} (attempt {})", url, request.attempt);
        }

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_transport_error(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(&url, status));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);
        if let Some(content_type) = content_type {
            if !content_type.contains("html") && !content_type.starts_with("text/") {
                return Err(FetchError::fatal(
                    &url,
                    Some(status.as_u16()),
                    format!("expected markup, got {}", content_type),
                ));
            }
        }

        // Decodes with the declared charset, falling back to UTF-8
        let body = response.text().await.map_err(|e| {
            if e.is_decode() {
                FetchError::fatal(&url, Some(status.as_u16()), format!("undecodable body: {}", e))
            } else {
                FetchError::transient(&url, Some(status.as_u16()), format!("body read failed: {}", e))
            }
        })?;

        Ok(RawPage {
            url,
            status: status.as_u16(),
            body,
        })
    }

    fn client_for(&self, slot: Option<usize>) -> &Client {
        slot.and_then(|s| self.clients.get(s))
            .unwrap_or(&self.clients[0])
    }
}

fn classify_status(url: &Url, status: StatusCode) -> FetchError {
    let code = status.as_u16();
    if TRANSIENT_STATUSES.contains(&code) {
        FetchError::transient(url, Some(code), format!("HTTP {}", code))
    } else {
        FetchError::fatal(url, Some(code), format!("HTTP {}", code))
    }
}

fn classify_transport_error(url: &Url, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::transient(url, None, "request timeout")
    } else if error.is_connect() {
        FetchError::transient(url, None, format!("connection failed: {}", error))
    } else if error.is_request() || error.is_body() {
        FetchError::transient(url, None, error.to_string())
    } else {
        FetchError::fatal(url, None, error.to_string())
    }
}
