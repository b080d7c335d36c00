//! Single-identifier store endpoints: app details and review summary

use std::collections::HashMap;

use serde::Deserialize;
use steamstats_core::{AppId, PartialRecord};

use crate::json::{
    join_names, lenient_bool, lenient_default, lenient_i64, lenient_string, null_to_empty,
    null_to_empty_vec,
};

pub const CATALOG: &str = "catalog";
pub const REVIEWS: &str = "reviews";

/// `{"<appid>": {"success": true, "data": {...}}}`
pub type AppDetailsResponse = HashMap<String, AppDetailsEntry>;

#[derive(Debug, Deserialize)]
pub struct AppDetailsEntry {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<AppDetails>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppDetails {
    #[serde(default, deserialize_with = "null_to_empty")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub required_age: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_free: Option<bool>,
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    pub developers: Vec<String>,
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    pub publishers: Vec<String>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub platforms: Platforms,
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub release_date: ReleaseDate,
}

#[derive(Debug, Default, Deserialize)]
pub struct Platforms {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub windows: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub mac: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub linux: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Genre {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReleaseDate {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
}

/// Reviews endpoint; only the aggregate summary is used
#[derive(Debug, Default, Deserialize)]
pub struct ReviewsResponse {
    #[serde(default)]
    pub query_summary: Option<QuerySummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuerySummary {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub num_reviews: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub review_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub review_score_desc: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_positive: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_negative: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_reviews: Option<i64>,
}

/// Payload for `appid`.
///
/// `None` when the key is missing or the store reports failure; that is the
/// store's way of saying it has no page for this identifier.
pub fn app_details_payload(appid: AppId, mut body: AppDetailsResponse) -> Option<AppDetails> {
    let entry = body.remove(&appid.to_string())?;
    if entry.success != Some(true) {
        log::debug!("{appid}: store reports success=false");
        return None;
    }
    entry.data
}

/// Normalize an app-details payload into catalog fields
pub fn normalize_app_details(appid: AppId, data: AppDetails) -> PartialRecord {
    let mut rec = PartialRecord::new(CATALOG, appid);
    rec.set("name", data.name.trim());
    rec.set_opt("type", data.kind);
    rec.set_opt("required_age", data.required_age);
    rec.set_opt("is_free", data.is_free);
    rec.set("developers", join_names(data.developers.iter().map(String::as_str)));
    rec.set("publishers", join_names(data.publishers.iter().map(String::as_str)));
    rec.set_opt("windows", data.platforms.windows);
    rec.set_opt("mac", data.platforms.mac);
    rec.set_opt("linux", data.platforms.linux);
    rec.set(
        "genres",
        join_names(data.genres.iter().filter_map(|g| g.description.as_deref())),
    );
    rec.set_opt("release_date", data.release_date.date);
    rec
}

/// Normalize `query_summary` of the reviews endpoint
pub fn normalize_query_summary(appid: AppId, body: ReviewsResponse) -> Option<PartialRecord> {
    let summary = body.query_summary?;
    let mut rec = PartialRecord::new(REVIEWS, appid);
    rec.set_opt("num_reviews", summary.num_reviews);
    rec.set_opt("review_score", summary.review_score);
    rec.set_opt("review_score_desc", summary.review_score_desc);
    rec.set_opt("total_positive", summary.total_positive);
    rec.set_opt("total_negative", summary.total_negative);
    rec.set_opt("total_reviews", summary.total_reviews);
    Some(rec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use steamstats_core::FieldValue;

    fn parse<T: serde::de::DeserializeOwned>(v: Value) -> T {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn payload_success() {
        let body = parse(json!({"10": {"success": true, "data": {"name": "Counter-Strike"}}}));
        assert!(app_details_payload(10, body).is_some());
    }

    #[test]
    fn payload_failure_or_missing() {
        let body = || parse(json!({"10": {"success": false}}));
        assert!(app_details_payload(10, body()).is_none());
        assert!(app_details_payload(20, body()).is_none());
    }

    #[test]
    fn details_full() {
        let data = parse(json!({
            "type": "game",
            "name": " Counter-Strike ",
            "required_age": "0",
            "is_free": false,
            "developers": ["Valve"],
            "publishers": ["Valve"],
            "platforms": {"windows": true, "mac": true, "linux": false},
            "genres": [{"id": "1", "description": "Action"}, {"id": "2"}],
            "release_date": {"coming_soon": false, "date": "1 Nov, 2000"}
        }));
        let rec = normalize_app_details(10, data);
        assert_eq!(rec.text("name"), Some("Counter-Strike"));
        assert_eq!(rec.text("type"), Some("game"));
        assert_eq!(rec.get("required_age"), Some(&FieldValue::Int(0)));
        assert_eq!(rec.get("linux"), Some(&FieldValue::Bool(false)));
        assert_eq!(rec.text("genres"), Some("Action"));
        assert_eq!(rec.text("release_date"), Some("1 Nov, 2000"));
    }

    #[test]
    fn details_sparse_does_not_panic() {
        let rec = normalize_app_details(10, parse(json!({"platforms": null, "release_date": []})));
        assert_eq!(rec.text("name"), Some(""));
        assert_eq!(rec.text("developers"), Some(""));
        assert!(!rec.contains("windows"));
        assert!(!rec.contains("release_date"));
    }

    #[test]
    fn reviews_summary() {
        let body = parse(json!({"success": 1, "query_summary": {
            "num_reviews": 20, "review_score": 9,
            "review_score_desc": "Overwhelmingly Positive",
            "total_positive": 900, "total_negative": 100, "total_reviews": 1000
        }}));
        let rec = normalize_query_summary(10, body).unwrap();
        assert_eq!(rec.get("total_reviews"), Some(&FieldValue::Int(1000)));
        assert_eq!(rec.text("review_score_desc"), Some("Overwhelmingly Positive"));
    }

    #[test]
    fn reviews_missing_summary() {
        assert!(normalize_query_summary(10, parse(json!({"success": 2}))).is_none());
    }
}
