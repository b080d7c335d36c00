//! Deal/price source: historical low and current store price.
//!
//! Lookups go through the provider's own game key (its "plain"), resolved
//! from the catalog identifier first.

use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use steamstats_core::{AppId, PartialRecord, Transport};

use crate::json::{lenient_default, lenient_f64, lenient_string, null_to_empty_vec};
use crate::source::{FetchPartial, LookupKey, fetch_as, url_with_params};

pub const SOURCE: &str = "deals";
pub const DEFAULT_BASE_URL: &str = "https://api.isthereanydeal.com";

#[derive(Debug, Clone)]
pub struct DealSource {
    transport: Transport,
    base_url: String,
    api_key: String,
    region: String,
    country: String,
}

/// Historical-low fields for one plain
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalLow {
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub shop: Option<String>,
}

/// The store listing picked for the queried identifier
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPrice {
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub shop: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PlainResponse {
    #[serde(default, deserialize_with = "lenient_default")]
    data: PlainData,
}

#[derive(Debug, Default, Deserialize)]
struct PlainData {
    #[serde(default, deserialize_with = "lenient_string")]
    plain: Option<String>,
}

/// Lowest-price and current-price documents: metadata plus one entry per plain
#[derive(Debug, Default, Deserialize)]
pub struct ItadPrices {
    #[serde(rename = ".meta", default, deserialize_with = "lenient_default")]
    pub meta: ItadMeta,
    #[serde(default, deserialize_with = "lenient_default")]
    pub data: HashMap<String, ItadEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItadMeta {
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItadEntry {
    /// Historical low
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub shop: ItadShop,
    /// Current listings
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    pub list: Vec<ItadListing>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItadShop {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItadListing {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_new: Option<f64>,
    #[serde(default, deserialize_with = "lenient_default")]
    pub shop: ItadShop,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

impl DealSource {
    pub fn new(transport: Transport, api_key: &str) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            region: "eu1".to_string(),
            country: "FR".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_region(mut self, region: &str, country: &str) -> Self {
        self.region = region.to_string();
        self.country = country.to_string();
        self
    }

    fn fetch<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Option<T> {
        let mut all = vec![("key", self.api_key.as_str())];
        all.extend_from_slice(params);
        let url = url_with_params(&format!("{}/{path}", self.base_url), &all);
        fetch_as(&self.transport, SOURCE, &url)
    }

    /// Provider key for a catalog identifier
    pub fn get_plain(&self, appid: AppId) -> Option<String> {
        let game_id = format!("app/{appid}");
        let body: PlainResponse = self.fetch(
            "v02/game/plain/",
            &[("shop", "steam"), ("game_id", &game_id)],
        )?;
        body.data.plain.filter(|p| !p.is_empty())
    }

    pub fn get_historical_low(&self, plain: &str) -> Option<HistoricalLow> {
        let body: ItadPrices = self.fetch(
            "v01/game/lowest/",
            &[("plains", plain), ("region", &self.region), ("country", &self.country)],
        )?;
        parse_historical_low(body, plain)
    }

    pub fn get_current_price(&self, appid: AppId, plain: &str) -> Option<CurrentPrice> {
        let body: ItadPrices = self.fetch(
            "v01/game/prices/",
            &[
                ("plains", plain),
                ("region", &self.region),
                ("country", &self.country),
                ("shops", "steam"),
                ("added", "0"),
            ],
        )?;
        parse_current_price(body, appid, plain)
    }

    /// All three lookups, or nothing
    pub fn get_deal_data(&self, appid: AppId) -> Option<PartialRecord> {
        let Some(plain) = self.get_plain(appid) else {
            log::warn!("{appid}: no {SOURCE} key");
            return None;
        };
        let low = self.get_historical_low(&plain)?;
        let Some(current) = self.get_current_price(appid, &plain) else {
            log::warn!("{appid}: no current price listing for {plain}");
            return None;
        };

        let mut record = PartialRecord::new(SOURCE, appid);
        record.set("itad_plain", plain);
        record.set_opt("historical_low_price", low.price);
        record.set_opt("historical_low_currency", low.currency);
        record.set_opt("historical_low_shop", low.shop);
        record.set_opt("current_price", current.price);
        record.set_opt("current_price_currency", current.currency);
        record.set_opt("current_price_shop", current.shop);
        Some(record)
    }
}

pub fn parse_historical_low(mut body: ItadPrices, plain: &str) -> Option<HistoricalLow> {
    let entry = body.data.remove(plain)?;
    Some(HistoricalLow {
        price: entry.price,
        currency: body.meta.currency,
        shop: entry.shop.name,
    })
}

pub fn parse_current_price(mut body: ItadPrices, appid: AppId, plain: &str) -> Option<CurrentPrice> {
    let entry = body.data.remove(plain)?;
    let listing = select_listing(&entry.list, appid)?;
    Some(CurrentPrice {
        price: listing.price_new,
        currency: body.meta.currency,
        shop: listing.shop.name.clone(),
    })
}

/// The provider sometimes lists several store entries for one key; keep the
/// first whose URL carries `appid` as a whole path segment.
pub fn select_listing(listings: &[ItadListing], appid: AppId) -> Option<&ItadListing> {
    let id = appid.to_string();
    listings.iter().find(|listing| {
        listing
            .url
            .as_deref()
            .is_some_and(|url| url_has_segment(url, &id))
    })
}

fn url_has_segment(url: &str, segment: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.split('/').any(|s| s == segment)
}

impl FetchPartial for DealSource {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn fetch_partial(&self, key: &LookupKey<'_>) -> Option<PartialRecord> {
        self.get_deal_data(key.appid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn parse<T: DeserializeOwned>(v: Value) -> T {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn listing_matches_whole_segment() {
        let listings: Vec<ItadListing> = parse(json!([
            {"url": "https://store.steampowered.com/app/100/", "price_new": 1.0},
            {"url": "https://store.steampowered.com/app/10/", "price_new": 2.0}
        ]));
        let picked = select_listing(&listings, 10).unwrap();
        assert_eq!(picked.price_new, Some(2.0));
    }

    #[test]
    fn listing_ignores_query() {
        let listings: Vec<ItadListing> = parse(json!([{"url": "https://store.example/sub/5?app=10"}]));
        assert!(select_listing(&listings, 10).is_none());
    }

    #[test]
    fn historical_low_fields() {
        let body = || -> ItadPrices {
            parse(json!({
                ".meta": {"currency": "EUR"},
                "data": {"halflife": {"price": 0.99, "shop": {"id": "steam", "name": "Steam"}}}
            }))
        };
        let low = parse_historical_low(body(), "halflife").unwrap();
        assert_eq!(low.price, Some(0.99));
        assert_eq!(low.currency.as_deref(), Some("EUR"));
        assert_eq!(low.shop.as_deref(), Some("Steam"));
        assert!(parse_historical_low(body(), "portal").is_none());
    }

    #[test]
    fn current_price_none_without_match() {
        let body: ItadPrices = parse(json!({"data": {"p": {"list": [{"url": "https://x/app/99/"}]}}}));
        assert!(parse_current_price(body, 10, "p").is_none());
    }

    #[test]
    fn unknown_plain_is_empty_data() {
        let body: PlainResponse = parse(json!({"data": []}));
        assert_eq!(body.data.plain, None);
    }
}
