//! HTTP GET + JSON decode behind a blocking interface.
//!
//! Uses async reqwest internally on a shared tokio runtime, but presents a
//! sync interface: the pipeline processes one identifier at a time.

use std::sync::{Arc, LazyLock, OnceLock};
use std::time::Duration;

use serde_json::Value;

use crate::error::TransportError;
use crate::retry::RetryPolicy;
use crate::shutdown::is_shutdown_requested;

/// Client timeouts, fixed for the process once the client is built
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    /// Whole-request timeout (stall detection)
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
        }
    }
}

static HTTP_CONFIG: OnceLock<HttpConfig> = OnceLock::new();

/// Set client timeouts. Must run before the first request; later calls are
/// ignored (logged).
pub fn set_http_config(config: HttpConfig) {
    if HTTP_CONFIG.set(config).is_err() {
        log::debug!("HTTP config already set, ignoring {config:?}");
    }
}

fn http_config() -> HttpConfig {
    *HTTP_CONFIG.get_or_init(HttpConfig::default)
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    let config = http_config();
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .pool_max_idle_per_host(4)
        .user_agent(concat!("steamstats/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Raw response: status plus full body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One GET request, no retries. Errors are connection-level only; any
/// status the server answers with is returned as a response.
pub trait HttpGet: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Blocking wrapper around the shared reqwest client
#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestGet;

impl HttpGet for ReqwestGet {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        SHARED_RUNTIME.handle().block_on(async {
            let resp = http_client()
                .get(url)
                .send()
                .await
                .map_err(|e| TransportError::from_reqwest(&e))?;
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .map_err(|e| TransportError::from_reqwest(&e))?;
            Ok(HttpResponse { status, body })
        })
    }
}

/// Blocking sleep, injectable so backoff can be observed in tests
pub trait Sleep: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// GET + JSON decode with the retry policy applied.
///
/// Cheap to clone; clones share the client and sleeper.
#[derive(Clone)]
pub struct Transport {
    client: Arc<dyn HttpGet>,
    sleeper: Arc<dyn Sleep>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Production transport: shared reqwest client, real sleeps
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_parts(Arc::new(ReqwestGet), Arc::new(ThreadSleep), policy)
    }

    pub fn with_parts(client: Arc<dyn HttpGet>, sleeper: Arc<dyn Sleep>, policy: RetryPolicy) -> Self {
        Self {
            client,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sleep through the injected sleeper (pacing between identifiers)
    pub fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            self.sleeper.sleep(duration);
        }
    }

    /// Fetch `url` and decode the body as JSON.
    ///
    /// `Ok(None)` means the server answered with an empty body, which callers
    /// treat as "no data" rather than a parse failure.
    pub fn fetch_json(&self, url: &str) -> Result<Option<Value>, TransportError> {
        let resp = self.get_with_retry(url)?;
        if resp.body.trim().is_empty() {
            log::debug!("empty body from {}", redact(url));
            return Ok(None);
        }
        serde_json::from_str(&resp.body)
            .map(Some)
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }

    /// GET with both backoff loops applied; returns the first 2xx response.
    pub fn get_with_retry(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut attempts = 0u32;
        let mut rate_limit_hits = 0u32;
        loop {
            let last_status = match self.client.get(url) {
                Ok(resp) if resp.status == self.policy.rate_limit_status => {
                    rate_limit_hits += 1;
                    if !self.policy.allows_rate_limit_retry(rate_limit_hits) {
                        return Err(TransportError::RateLimited {
                            retries: rate_limit_hits - 1,
                        });
                    }
                    let delay = self.policy.rate_limit_backoff(rate_limit_hits);
                    log::warn!(
                        "Rate limited ({}), waiting {:?} before retrying {}",
                        resp.status,
                        delay,
                        redact(url)
                    );
                    self.sleeper.sleep(delay);
                    if is_shutdown_requested() {
                        return Err(TransportError::Interrupted);
                    }
                    continue;
                }
                Ok(resp) if self.policy.is_retryable_status(resp.status) => Some(resp.status),
                Ok(resp) if resp.is_success() => return Ok(resp),
                Ok(resp) => {
                    return Err(TransportError::Http {
                        status: Some(resp.status),
                        message: snippet(&resp.body),
                    });
                }
                Err(e) if e.is_retryable() => {
                    log::debug!("{}: {e}", redact(url));
                    None
                }
                Err(e) => return Err(e),
            };

            attempts += 1;
            if attempts >= self.policy.max_attempts {
                log::debug!("{}: failed permanently after {attempts} attempts", redact(url));
                return Err(TransportError::Exhausted {
                    attempts,
                    last: last_status,
                });
            }
            let delay = self.policy.backoff_duration(attempts);
            log::debug!(
                "{}: attempt {attempts}/{} failed (status {}), retrying in {delay:?}",
                redact(url),
                self.policy.max_attempts,
                last_status.map_or("-".to_string(), |s| s.to_string()),
            );
            self.sleeper.sleep(delay);
        }
    }
}

/// Drop the query string so API keys never reach the logs
pub fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

fn snippet(body: &str) -> String {
    const MAX: usize = 120;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
