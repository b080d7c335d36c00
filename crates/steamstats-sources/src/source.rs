//! Capability shared by every data source

use serde::de::DeserializeOwned;
use serde_json::Value;
use steamstats_core::{AppId, PartialRecord, Transport, TransportError, name_similarity};
use steamstats_core::transport::redact;

/// What a source may key its lookup on. Catalog-keyed sources use `appid`,
/// name-keyed ones use `name` (known once the catalog record is in).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupKey<'a> {
    pub appid: AppId,
    pub name: Option<&'a str>,
}

impl<'a> LookupKey<'a> {
    pub fn new(appid: AppId, name: Option<&'a str>) -> Self {
        Self { appid, name }
    }

    /// Non-blank name, if any
    pub fn title(&self) -> Option<&'a str> {
        self.name.map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Fetch one source's partial record for one identifier.
///
/// `None` means "no data from this source"; transport failures are logged
/// and folded into it so one flaky provider never stops a run.
pub trait FetchPartial {
    /// Short source name for logs and statistics
    fn source(&self) -> &'static str;

    fn fetch_partial(&self, key: &LookupKey<'_>) -> Option<PartialRecord>;
}

/// `fetch_json`, with every failure folded into `None` (logged)
pub(crate) fn fetch_or_none(transport: &Transport, source: &str, url: &str) -> Option<Value> {
    match transport.fetch_json(url) {
        Ok(Some(v)) => Some(v),
        Ok(None) => {
            log::debug!("{source}: empty response from {}", redact(url));
            None
        }
        Err(e) => {
            report_failure(source, url, &e);
            None
        }
    }
}

/// Log a failed request. An interrupted wait is expected during shutdown.
pub(crate) fn report_failure(source: &str, url: &str, e: &TransportError) {
    match e {
        TransportError::Interrupted => log::debug!("{source}: {} interrupted", redact(url)),
        _ => log::warn!("{source}: {} failed: {e}", redact(url)),
    }
}

/// Decode a response document; a shape mismatch counts as "no data"
pub(crate) fn decode<T: DeserializeOwned>(source: &str, body: Value) -> Option<T> {
    match serde_json::from_value(body) {
        Ok(doc) => Some(doc),
        Err(e) => {
            log::warn!("{source}: unexpected response shape: {e}");
            None
        }
    }
}

/// [`fetch_or_none`] + [`decode`]
pub(crate) fn fetch_as<T: DeserializeOwned>(transport: &Transport, source: &str, url: &str) -> Option<T> {
    decode(source, fetch_or_none(transport, source, url)?)
}

/// Name-keyed sources: reject a fuzzy match whose title is too far from the
/// one we searched for. `min_similarity` of 0 accepts everything.
pub(crate) fn accept_match(source: &str, queried: &str, matched: &str, min_similarity: f64) -> bool {
    if min_similarity <= 0.0 {
        return true;
    }
    let score = name_similarity(queried, matched);
    if score < min_similarity {
        log::warn!(
            "{source}: best match '{matched}' for '{queried}' scores {score:.2} < {min_similarity:.2}, ignored"
        );
        return false;
    }
    log::debug!("{source}: '{queried}' matched '{matched}' ({score:.2})");
    true
}

/// Build `base` + query string with proper encoding
pub(crate) fn url_with_params(base: &str, params: &[(&str, &str)]) -> String {
    match reqwest::Url::parse_with_params(base, params) {
        Ok(url) => url.to_string(),
        Err(e) => {
            log::debug!("invalid base URL {base}: {e}");
            base.to_string()
        }
    }
}
