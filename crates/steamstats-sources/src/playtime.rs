//! Playtime from the account's owned-games list

use std::collections::HashMap;
use std::sync::OnceLock;

use steamstats_core::{AppId, PartialRecord};

use crate::source::{FetchPartial, LookupKey};
use crate::steam::{OwnedGame, SteamWebApi};

pub const SOURCE: &str = "playtime";

/// Looks identifiers up in the owned-games list, fetched on first use and
/// kept for the rest of the run.
#[derive(Debug)]
pub struct PlaytimeSource {
    api: SteamWebApi,
    account_id: String,
    owned: OnceLock<HashMap<AppId, OwnedGame>>,
}

impl PlaytimeSource {
    pub fn new(api: SteamWebApi, account_id: &str) -> Self {
        Self {
            api,
            account_id: account_id.to_string(),
            owned: OnceLock::new(),
        }
    }

    fn owned(&self) -> &HashMap<AppId, OwnedGame> {
        self.owned.get_or_init(|| match self.api.owned_games(&self.account_id) {
            Ok(games) => {
                log::info!("{} owned games loaded", games.len());
                games.into_iter().map(|g| (g.appid, g)).collect()
            }
            Err(e) => {
                log::warn!("{SOURCE}: owned games unavailable: {e}");
                HashMap::new()
            }
        })
    }

    pub fn get_playtime(&self, appid: AppId) -> Option<PartialRecord> {
        self.owned().get(&appid).map(playtime_record)
    }
}

pub fn playtime_record(game: &OwnedGame) -> PartialRecord {
    let mut record = PartialRecord::new(SOURCE, game.appid);
    record.set("playtime_forever", game.playtime_forever);
    record.set("playtime_windows", game.playtime_windows);
    record.set("playtime_mac", game.playtime_mac);
    record.set("playtime_linux", game.playtime_linux);
    record
}

impl FetchPartial for PlaytimeSource {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn fetch_partial(&self, key: &LookupKey<'_>) -> Option<PartialRecord> {
        self.get_playtime(key.appid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steamstats_core::FieldValue;

    #[test]
    fn record_fields() {
        let game = OwnedGame {
            appid: 70,
            name: Some("Half-Life".into()),
            playtime_forever: 120,
            playtime_windows: 100,
            playtime_mac: 0,
            playtime_linux: 20,
        };
        let r = playtime_record(&game);
        assert_eq!(r.get("playtime_forever"), Some(&FieldValue::Int(120)));
        assert_eq!(r.get("playtime_linux"), Some(&FieldValue::Int(20)));
        assert_eq!(r.len(), 4);
    }
}
