//! Completion-time estimates, matched by title

use serde::Deserialize;
use steamstats_core::{PartialRecord, Transport};

use crate::json::{lenient_f64, lenient_i64, lenient_string, null_to_empty_vec, round1};
use crate::source::{FetchPartial, LookupKey, accept_match, fetch_as, url_with_params};

pub const SOURCE: &str = "completion-time";
pub const DEFAULT_BASE_URL: &str = "https://howlongtobeat.com";

/// Estimates for the best search match. Hours, `None` when the provider has
/// no figure.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionEstimates {
    pub name: String,
    pub url: Option<String>,
    pub main: Option<f64>,
    pub main_extra: Option<f64>,
    pub completionist: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    data: Vec<SearchHit>,
}

/// One search hit; `comp_*` values are seconds
#[derive(Debug, Default, Deserialize)]
pub struct SearchHit {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub game_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub game_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub comp_main: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub comp_plus: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub comp_100: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CompletionTimeSource {
    transport: Transport,
    base_url: String,
    min_similarity: f64,
}

impl CompletionTimeSource {
    pub fn new(transport: Transport, min_similarity: f64) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            min_similarity,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn get_completion_estimates(&self, name: &str) -> Option<CompletionEstimates> {
        let url = url_with_params(&format!("{}/api/search", self.base_url), &[("q", name)]);
        let body: SearchResponse = fetch_as(&self.transport, SOURCE, &url)?;
        let first = body.data.into_iter().next()?;
        let estimates = parse_entry(first, &self.base_url)?;
        accept_match(SOURCE, name, &estimates.name, self.min_similarity).then_some(estimates)
    }
}

fn parse_entry(hit: SearchHit, base_url: &str) -> Option<CompletionEstimates> {
    Some(CompletionEstimates {
        name: hit.game_name?,
        url: hit.game_id.map(|id| format!("{base_url}/game/{id}")),
        main: seconds_to_hours(hit.comp_main),
        main_extra: seconds_to_hours(hit.comp_plus),
        completionist: seconds_to_hours(hit.comp_100),
    })
}

/// `-1` and `0` mean "no data", never a zero-hour game
pub fn seconds_to_hours(seconds: Option<f64>) -> Option<f64> {
    seconds
        .filter(|s| *s > 0.0)
        .map(|s| round1(s / 3600.0))
}

impl FetchPartial for CompletionTimeSource {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn fetch_partial(&self, key: &LookupKey<'_>) -> Option<PartialRecord> {
        let estimates = self.get_completion_estimates(key.title()?)?;
        let mut record = PartialRecord::new(SOURCE, key.appid);
        record.set("howlongtobeat_name", estimates.name);
        record.set_opt("howlongtobeat_url", estimates.url);
        record.set_opt("howlongtobeat_main", estimates.main);
        record.set_opt("howlongtobeat_main_extra", estimates.main_extra);
        record.set_opt("howlongtobeat_completionist", estimates.completionist);
        Some(record)
    }
}
