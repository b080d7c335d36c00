//! Critic scores, matched by title

use serde::Deserialize;
use steamstats_core::{PartialRecord, Transport};

use crate::json::{lenient_f64, lenient_i64, lenient_string};
use crate::source::{FetchPartial, LookupKey, accept_match, fetch_as, url_with_params};

pub const SOURCE: &str = "critic-score";
pub const DEFAULT_BASE_URL: &str = "https://api.opencritic.com";

#[derive(Debug, Default, Deserialize)]
struct OcSearchHit {
    #[serde(default, deserialize_with = "lenient_i64")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OcGame {
    #[serde(default, deserialize_with = "lenient_string")]
    pub tier: Option<String>,
    /// `-1` while unscored
    #[serde(rename = "medianScore", default, deserialize_with = "lenient_f64")]
    pub median_score: Option<f64>,
    #[serde(rename = "numReviews", default, deserialize_with = "lenient_i64")]
    pub num_reviews: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CriticScoreSource {
    transport: Transport,
    base_url: String,
    min_similarity: f64,
}

impl CriticScoreSource {
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

    /// First search hit as `(id, name)`
    fn search(&self, name: &str) -> Option<(i64, String)> {
        let url = url_with_params(
            &format!("{}/api/game/search", self.base_url),
            &[("criteria", name)],
        );
        let hits: Vec<OcSearchHit> = fetch_as(&self.transport, SOURCE, &url)?;
        let first = hits.into_iter().next()?;
        Some((first.id?, first.name?))
    }

    /// Score fields for the title best matching `name`. The record's
    /// identifier is filled in by the caller.
    pub fn get_critic_score(&self, name: &str) -> Option<CriticScore> {
        let (id, matched) = self.search(name)?;
        if !accept_match(SOURCE, name, &matched, self.min_similarity) {
            return None;
        }
        let game: OcGame = fetch_as(
            &self.transport,
            SOURCE,
            &format!("{}/api/game/{id}", self.base_url),
        )?;
        Some(parse_game(game, matched))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CriticScore {
    pub name: String,
    pub tier: Option<String>,
    pub median_score: Option<f64>,
    pub reviews_number: Option<i64>,
}

fn parse_game(game: OcGame, name: String) -> CriticScore {
    CriticScore {
        name,
        tier: game.tier,
        median_score: game.median_score.filter(|s| *s != -1.0),
        reviews_number: game.num_reviews,
    }
}

impl FetchPartial for CriticScoreSource {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn fetch_partial(&self, key: &LookupKey<'_>) -> Option<PartialRecord> {
        let score = self.get_critic_score(key.title()?)?;
        let mut record = PartialRecord::new(SOURCE, key.appid);
        record.set("opencritic_name", score.name);
        record.set_opt("opencritic_tier", score.tier);
        record.set_opt("opencritic_median_score", score.median_score);
        record.set_opt("opencritic_reviews_number", score.reviews_number);
        Some(record)
    }
}
