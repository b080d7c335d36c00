//! Web API lists: owned games (with playtime), wishlist, full app list

use serde::Deserialize;
use serde::de::DeserializeOwned;
use steamstats_core::{AppId, Transport, TransportError};
use steamstats_core::transport::redact;

use crate::json::{lenient_appid, lenient_default, lenient_i64, lenient_string, null_to_empty_vec};
use crate::source::url_with_params;

/// One entry of the owned-games list. Playtimes are in minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedGame {
    pub appid: AppId,
    pub name: Option<String>,
    pub playtime_forever: i64,
    pub playtime_windows: i64,
    pub playtime_mac: i64,
    pub playtime_linux: i64,
}

#[derive(Debug, Default, Deserialize)]
struct OwnedGamesResponse {
    #[serde(default, deserialize_with = "lenient_default")]
    response: OwnedGamesList,
}

#[derive(Debug, Default, Deserialize)]
struct OwnedGamesList {
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    games: Vec<OwnedGameEntry>,
}

#[derive(Debug, Deserialize)]
struct OwnedGameEntry {
    #[serde(default, deserialize_with = "lenient_appid")]
    appid: Option<AppId>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    playtime_forever: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    playtime_windows_forever: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    playtime_mac_forever: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    playtime_linux_forever: Option<i64>,
}

impl OwnedGameEntry {
    fn into_game(self) -> Option<OwnedGame> {
        Some(OwnedGame {
            appid: self.appid?,
            name: self.name,
            playtime_forever: self.playtime_forever.unwrap_or(0),
            playtime_windows: self.playtime_windows_forever.unwrap_or(0),
            playtime_mac: self.playtime_mac_forever.unwrap_or(0),
            playtime_linux: self.playtime_linux_forever.unwrap_or(0),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct AppEntry {
    #[serde(default, deserialize_with = "lenient_appid")]
    appid: Option<AppId>,
}

#[derive(Debug, Default, Deserialize)]
struct WishlistResponse {
    #[serde(default, deserialize_with = "lenient_default")]
    response: WishlistItems,
}

#[derive(Debug, Default, Deserialize)]
struct WishlistItems {
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    items: Vec<AppEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct AppListResponse {
    #[serde(default, deserialize_with = "lenient_default")]
    applist: AppList,
}

#[derive(Debug, Default, Deserialize)]
struct AppList {
    #[serde(default, deserialize_with = "null_to_empty_vec")]
    apps: Vec<AppEntry>,
}

/// Keyed Web API client. Unlike the per-identifier adapters these calls
/// surface errors: they back whole subcommands.
#[derive(Debug, Clone)]
pub struct SteamWebApi {
    transport: Transport,
    api_url: String,
    api_key: String,
}

impl SteamWebApi {
    pub fn new(transport: Transport, api_key: &str) -> Self {
        Self {
            transport,
            api_url: super::DEFAULT_API_URL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    fn get<T: DeserializeOwned + Default>(&self, path: &str, params: &[(&str, &str)]) -> Result<T, TransportError> {
        let url = url_with_params(&format!("{}/{path}", self.api_url), params);
        match self.transport.fetch_json(&url)? {
            Some(body) => serde_json::from_value(body).map_err(|e| TransportError::Malformed(e.to_string())),
            None => {
                log::warn!("{}: empty response", redact(&url));
                Ok(T::default())
            }
        }
    }

    /// Owned games of `user_id`, free-to-play titles included
    pub fn owned_games(&self, user_id: &str) -> Result<Vec<OwnedGame>, TransportError> {
        let body: OwnedGamesResponse = self.get(
            "IPlayerService/GetOwnedGames/v0001/",
            &[
                ("key", &self.api_key),
                ("steamid", user_id),
                ("format", "json"),
                ("include_appinfo", "1"),
                ("include_played_free_games", "1"),
            ],
        )?;
        let games: Vec<OwnedGame> = body
            .response
            .games
            .into_iter()
            .filter_map(OwnedGameEntry::into_game)
            .collect();
        if games.is_empty() {
            log::warn!("No owned games for {user_id} (private profile?)");
        }
        Ok(games)
    }

    pub fn wishlist_ids(&self, user_id: &str) -> Result<Vec<AppId>, TransportError> {
        let body: WishlistResponse = self.get("IWishlistService/GetWishlist/v1/", &[("steamid", user_id)])?;
        Ok(appids(body.response.items))
    }

    /// Every identifier in the catalog
    pub fn all_app_ids(&self) -> Result<Vec<AppId>, TransportError> {
        let body: AppListResponse = self.get(
            "ISteamApps/GetAppList/v0002/",
            &[("key", &self.api_key), ("format", "json")],
        )?;
        Ok(appids(body.applist.apps))
    }
}

fn appids(items: Vec<AppEntry>) -> Vec<AppId> {
    items.into_iter().filter_map(|item| item.appid).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(v: serde_json::Value) -> Option<OwnedGame> {
        serde_json::from_value::<OwnedGameEntry>(v).unwrap().into_game()
    }

    #[test]
    fn owned_game_defaults() {
        let g = entry(json!({"appid": 10, "playtime_forever": 42})).unwrap();
        assert_eq!(g.playtime_forever, 42);
        assert_eq!(g.playtime_linux, 0);
        assert_eq!(g.name, None);
    }

    #[test]
    fn owned_game_needs_appid() {
        assert!(entry(json!({"playtime_forever": 42})).is_none());
    }

    #[test]
    fn owned_games_list_parsed() {
        let body: OwnedGamesResponse = serde_json::from_value(json!({"response": {"game_count": 2, "games": [
            {"appid": 70, "name": "Half-Life", "playtime_forever": 120, "playtime_linux_forever": 20},
            {"appid": 220, "playtime_forever": 0}
        ]}}))
        .unwrap();
        let games: Vec<_> = body.response.games.into_iter().filter_map(OwnedGameEntry::into_game).collect();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].playtime_linux, 20);
    }

    #[test]
    fn appids_skip_garbage() {
        let items: Vec<AppEntry> =
            serde_json::from_value(json!([{"appid": 10}, {"name": "x"}, {"appid": "20"}])).unwrap();
        assert_eq!(appids(items), vec![10, 20]);
    }

    #[test]
    fn private_profile_is_empty() {
        let body: OwnedGamesResponse = serde_json::from_value(json!({"response": {}})).unwrap();
        assert!(body.response.games.is_empty());
    }
}
