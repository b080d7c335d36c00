//! Batch store endpoint (`IStoreBrowseService/GetItems`).
//!
//! Items come back in a different shape than the single-identifier
//! endpoints: numeric type codes, Unix release timestamps and a percentage
//! review summary. Everything is normalized to the single-identifier
//! field set so the merge never sees which path produced a record.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Value, json};
use steamstats_core::{AppId, PartialRecord};

use crate::json::{
    join_names, lenient_appid, lenient_bool, lenient_default, lenient_f64, lenient_i64,
    lenient_string, null_to_empty_vec,
};
use crate::steam::details::CATALOG;

#[derive(Debug, Default, Deserialize)]
pub struct BatchResponse {
    #[serde(default, deserialize_with = "lenient_default")]
    pub response: StoreItems,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreItems {
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    pub store_items: Vec<StoreItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreItem {
    #[serde(default, deserialize_with = "lenient_appid")]
    pub appid: Option<AppId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub success: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_i64")]
    pub kind: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_free: Option<bool>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub basic_info: BasicInfo,
    #[serde(default, deserialize_with = "lenient_default")]
    pub platforms: StorePlatforms,
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    pub genres: Vec<Named>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub game_rating: GameRating,
    #[serde(default, deserialize_with = "lenient_default")]
    pub release: Release,
    #[serde(default, deserialize_with = "lenient_default")]
    pub reviews: StoreReviews,
}

#[derive(Debug, Default, Deserialize)]
pub struct BasicInfo {
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    pub developers: Vec<Named>,
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    pub publishers: Vec<Named>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Named {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorePlatforms {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub windows: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub mac: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub steamos_linux: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GameRating {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub required_age: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Release {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub steam_release_date: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreReviews {
    #[serde(default)]
    pub summary_filtered: Option<ReviewSummary>,
}

/// Percentage-based summary; counts are derived from it
#[derive(Debug, Default, Deserialize)]
pub struct ReviewSummary {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub review_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percent_positive: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub review_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub review_score_label: Option<String>,
}

/// Largest id list the endpoint accepts in one call
pub const MAX_BATCH: usize = 200;

/// Store item type code → the string the app-details endpoint uses
pub fn item_type_name(code: i64) -> String {
    let name = match code {
        0 => "game",
        1 => "demo",
        2 => "mod",
        3 => "movie",
        4 => "dlc",
        5 => "guide",
        6 => "software",
        7 => "video",
        8 => "series",
        9 => "episode",
        10 => "hardware",
        11 => "music",
        12 => "beta",
        13 => "tool",
        14 => "advertising",
        other => return other.to_string(),
    };
    name.to_string()
}

/// Unix seconds → "1 Nov, 2000" (the app-details date format), UTC
pub fn format_release_date(timestamp: i64) -> Option<String> {
    if timestamp <= 0 {
        return None;
    }
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%-d %b, %Y").to_string())
}

/// `input_json` request document for `ids`
pub fn request_document(ids: &[AppId], language: &str, country: &str) -> String {
    let ids: Vec<Value> = ids.iter().map(|id| json!({ "appid": id })).collect();
    json!({
        "ids": ids,
        "context": {"language": language, "country_code": country},
        "data_request": {
            "include_basic_info": true,
            "include_release": true,
            "include_platforms": true,
            "include_reviews": true,
            "include_ratings": true
        }
    })
    .to_string()
}

/// Successful items of a batch response, by identifier
pub fn store_items(body: BatchResponse) -> impl Iterator<Item = (AppId, StoreItem)> {
    body.response.store_items.into_iter().filter_map(|item| {
        let appid = item.appid?;
        if item.success != Some(1) {
            log::debug!("{appid}: batch item not successful");
            return None;
        }
        Some((appid, item))
    })
}

fn names(list: &[Named]) -> String {
    join_names(list.iter().filter_map(|n| n.name.as_deref()))
}

/// Normalize one store item into catalog + review fields.
///
/// `num_reviews` is left unset: on the single-identifier path it is the size
/// of one review page, which this endpoint does not report.
pub fn normalize_store_item(appid: AppId, item: StoreItem) -> PartialRecord {
    let mut rec = PartialRecord::new(CATALOG, appid);
    rec.set("name", item.name.as_deref().unwrap_or_default().trim());
    rec.set_opt("type", item.kind.map(item_type_name));
    rec.set_opt("required_age", item.game_rating.required_age);
    rec.set_opt("is_free", item.is_free);
    rec.set("developers", names(&item.basic_info.developers));
    rec.set("publishers", names(&item.basic_info.publishers));
    rec.set_opt("windows", item.platforms.windows);
    rec.set_opt("mac", item.platforms.mac);
    rec.set_opt("linux", item.platforms.steamos_linux);
    rec.set("genres", names(&item.genres));
    rec.set_opt(
        "release_date",
        item.release.steam_release_date.and_then(format_release_date),
    );

    if let Some(summary) = item.reviews.summary_filtered {
        rec.set_opt("total_reviews", summary.review_count);
        if let (Some(count), Some(percent)) = (summary.review_count, summary.percent_positive) {
            let (positive, negative) = split_review_count(count, percent);
            rec.set("total_positive", positive);
            rec.set("total_negative", negative);
        }
        rec.set_opt("review_score", summary.review_score);
        rec.set_opt("review_score_desc", summary.review_score_label);
    }
    rec
}

/// Percentage summary → (positive, negative) counts
pub fn split_review_count(count: i64, percent_positive: f64) -> (i64, i64) {
    let positive = (percent_positive / 100.0 * count as f64).round() as i64;
    let positive = positive.clamp(0, count.max(0));
    (positive, count - positive)
}
