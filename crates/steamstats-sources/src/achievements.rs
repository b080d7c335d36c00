//! Per-account achievement progress

use serde::Deserialize;
use steamstats_core::{AppId, PartialRecord, Transport, TransportError};

use crate::json::{lenient_bool, lenient_default, lenient_string, null_to_empty_vec, round1};
use crate::source::{FetchPartial, LookupKey, decode, report_failure, url_with_params};
use crate::steam::DEFAULT_API_URL;

pub const SOURCE: &str = "achievements";

#[derive(Debug, Default, Deserialize)]
pub struct PlayerStatsResponse {
    #[serde(default, deserialize_with = "lenient_default")]
    pub playerstats: PlayerStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayerStats {
    /// Set instead of the list, e.g. "Requested app has no stats"
    #[serde(default, deserialize_with = "lenient_string")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    pub achievements: Vec<Achievement>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Achievement {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub achieved: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct AchievementsSource {
    transport: Transport,
    api_url: String,
    api_key: String,
    account_id: String,
}

impl AchievementsSource {
    pub fn new(transport: Transport, api_key: &str, account_id: &str) -> Self {
        Self {
            transport,
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.to_string(),
            account_id: account_id.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Achievement counts for `appid`. Titles without stats (and failed
    /// requests) give an empty record.
    pub fn get_achievements(&self, appid: AppId) -> PartialRecord {
        let url = url_with_params(
            &format!("{}/ISteamUserStats/GetPlayerAchievements/v0001/", self.api_url),
            &[
                ("appid", &appid.to_string()),
                ("key", &self.api_key),
                ("steamid", &self.account_id),
            ],
        );
        match self.transport.fetch_json(&url) {
            Ok(Some(body)) => match decode::<PlayerStatsResponse>(SOURCE, body) {
                Some(stats) => normalize_player_stats(appid, stats),
                None => PartialRecord::new(SOURCE, appid),
            },
            Ok(None) => PartialRecord::new(SOURCE, appid),
            Err(e) => {
                match no_stats_reason(&e) {
                    Some(reason) => log::debug!("{appid}: {reason}"),
                    None => report_failure(SOURCE, &url, &e),
                }
                PartialRecord::new(SOURCE, appid)
            }
        }
    }
}

/// Titles without stats are answered with HTTP 400 and a `playerstats.error`
/// body; that is an expected outcome, not a failure.
pub fn no_stats_reason(e: &TransportError) -> Option<String> {
    match e {
        TransportError::Http {
            status: Some(400),
            message,
        } => serde_json::from_str::<PlayerStatsResponse>(message)
            .ok()?
            .playerstats
            .error,
        _ => None,
    }
}

/// Turn a `playerstats` document into counts and a completion percentage
pub fn normalize_player_stats(appid: AppId, body: PlayerStatsResponse) -> PartialRecord {
    let mut record = PartialRecord::new(SOURCE, appid);
    let stats = body.playerstats;
    if let Some(error) = stats.error {
        log::debug!("{appid}: {error}");
        return record;
    }
    if stats.achievements.is_empty() {
        return record;
    }
    let total = stats.achievements.len() as i64;
    let achieved = stats
        .achievements
        .iter()
        .filter(|a| a.achieved.unwrap_or(false))
        .count() as i64;
    record.set("achievements_achieved", achieved);
    record.set("achievements_total", total);
    record.set("achievements_percentage", completion_percentage(achieved, total));
    record
}

fn completion_percentage(achieved: i64, total: i64) -> f64 {
    round1(achieved as f64 / total as f64 * 100.0)
}

impl FetchPartial for AchievementsSource {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn fetch_partial(&self, key: &LookupKey<'_>) -> Option<PartialRecord> {
        let record = self.get_achievements(key.appid);
        (!record.is_empty()).then_some(record)
    }
}
