//! Error taxonomy for outbound requests and input loading

use std::path::PathBuf;

/// Failure of one outbound request after the retry policy gave up.
///
/// Adapters translate every variant into "no data from this source for this
/// identifier"; none of them aborts a run.
#[derive(Debug)]
pub enum TransportError {
    /// Non-retryable HTTP status, or a connection failure (no status)
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Bounded retries for server errors / connection failures spent
    Exhausted { attempts: u32, last: Option<u16> },
    /// Rate-limit bound reached (only when a bound is configured)
    RateLimited { retries: u32 },
    /// Body was not valid JSON
    Malformed(String),
    /// Shutdown requested while waiting out a backoff
    Interrupted,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Exhausted {
                attempts,
                last: Some(s),
            } => write!(f, "gave up after {attempts} attempts (last status {s})"),
            Self::Exhausted {
                attempts,
                last: None,
            } => write!(f, "gave up after {attempts} attempts (connection failure)"),
            Self::RateLimited { retries } => {
                write!(f, "still rate limited after {retries} retries")
            }
            Self::Malformed(msg) => write!(f, "malformed JSON body: {msg}"),
            Self::Interrupted => write!(f, "interrupted by shutdown request"),
        }
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    /// Create a connection-level error from a reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url_message(),
        }
    }

    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// Only connection failures without a status qualify; the transport has
    /// already spent its budget for everything else.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { status: None, .. })
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            Self::Exhausted { last, .. } => *last,
            Self::RateLimited { .. } => Some(429),
            Self::Malformed(_) | Self::Interrupted => None,
        }
    }
}

/// Strip the URL (which may carry API keys) from reqwest error messages
trait WithoutUrl {
    fn without_url_message(&self) -> String;
}

impl WithoutUrl for reqwest::Error {
    fn without_url_message(&self) -> String {
        if self.is_timeout() {
            "request timed out".to_string()
        } else if self.is_connect() {
            "connection failed".to_string()
        } else if self.is_body() || self.is_decode() {
            "failed to read response body".to_string()
        } else {
            "request failed".to_string()
        }
    }
}

/// Failure to load the identifier list. Always fatal for the run.
#[derive(Debug)]
pub enum InputError {
    NotFound(PathBuf),
    Io(std::io::Error),
    /// Header has no column with the requested name
    MissingField { field: String, header: String },
    /// File has no usable identifiers at all
    Empty(PathBuf),
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(p) => write!(f, "{} is not a file", p.display()),
            Self::Io(e) => write!(f, "IO: {e}"),
            Self::MissingField { field, header } => {
                write!(f, "no '{field}' column in header '{header}'")
            }
            Self::Empty(p) => write!(f, "no identifiers found in {}", p.display()),
        }
    }
}

impl std::error::Error for InputError {}

impl From<std::io::Error> for InputError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
