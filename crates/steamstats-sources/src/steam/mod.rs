//! Primary source: store catalog and reviews

pub mod batch;
pub mod details;
pub mod library;

use std::collections::HashMap;

use steamstats_core::{AppId, PartialRecord, Transport};

use crate::source::{FetchPartial, LookupKey, fetch_as, url_with_params};

pub use library::{OwnedGame, SteamWebApi};

pub const DEFAULT_STORE_URL: &str = "https://store.steampowered.com";
pub const DEFAULT_API_URL: &str = "https://api.steampowered.com";

/// Store client for catalog details and review summaries.
#[derive(Debug, Clone)]
pub struct SteamStore {
    transport: Transport,
    store_url: String,
    api_url: String,
    language: String,
    country: String,
}

impl SteamStore {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            store_url: DEFAULT_STORE_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            language: "english".to_string(),
            country: "US".to_string(),
        }
    }

    pub fn with_urls(mut self, store_url: &str, api_url: &str) -> Self {
        self.store_url = store_url.trim_end_matches('/').to_string();
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Catalog fields for one identifier, `None` if the store has no page
    pub fn get_game_data(&self, appid: AppId) -> Option<PartialRecord> {
        let url = url_with_params(
            &format!("{}/api/appdetails", self.store_url),
            &[("appids", &appid.to_string()), ("l", &self.language)],
        );
        let body = fetch_as::<details::AppDetailsResponse>(&self.transport, details::CATALOG, &url)?;
        let data = details::app_details_payload(appid, body)?;
        Some(details::normalize_app_details(appid, data))
    }

    /// Aggregate review counts for one identifier
    pub fn get_reviews(&self, appid: AppId) -> Option<PartialRecord> {
        let url = url_with_params(
            &format!("{}/appreviews/{appid}", self.store_url),
            &[("json", "1"), ("language", "all"), ("purchase_type", "all")],
        );
        let body = fetch_as::<details::ReviewsResponse>(&self.transport, details::REVIEWS, &url)?;
        details::normalize_query_summary(appid, body)
    }

    /// Catalog + review fields for many identifiers at once.
    ///
    /// Identifiers missing from the result should go through
    /// [`get_game_data`](Self::get_game_data) / [`get_reviews`](Self::get_reviews).
    pub fn get_items_batch(&self, ids: &[AppId]) -> HashMap<AppId, PartialRecord> {
        let mut found = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(batch::MAX_BATCH) {
            let url = url_with_params(
                &format!("{}/IStoreBrowseService/GetItems/v1/", self.api_url),
                &[(
                    "input_json",
                    &batch::request_document(chunk, &self.language, &self.country),
                )],
            );
            let Some(body) = fetch_as::<batch::BatchResponse>(&self.transport, "catalog-batch", &url) else {
                continue;
            };
            for (appid, item) in batch::store_items(body) {
                if chunk.contains(&appid) {
                    found.insert(appid, batch::normalize_store_item(appid, item));
                }
            }
        }
        log::debug!("batch: {}/{} identifiers resolved", found.len(), ids.len());
        found
    }
}

/// Catalog details plus reviews through the single-identifier endpoints
#[derive(Debug, Clone)]
pub struct CatalogSource {
    store: SteamStore,
}

impl CatalogSource {
    pub fn new(store: SteamStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SteamStore {
        &self.store
    }
}

impl FetchPartial for CatalogSource {
    fn source(&self) -> &'static str {
        details::CATALOG
    }

    fn fetch_partial(&self, key: &LookupKey<'_>) -> Option<PartialRecord> {
        let mut record = self.store.get_game_data(key.appid)?;
        match self.store.get_reviews(key.appid) {
            Some(reviews) => record.absorb(reviews),
            None => log::warn!("{}: no review data", key.appid),
        }
        Some(record)
    }
}
