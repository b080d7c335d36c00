//! Source adapters. Each turns one provider's responses into a
//! [`PartialRecord`](steamstats_core::PartialRecord) for one identifier.

pub mod achievements;
pub mod hltb;
pub mod itad;
pub mod json;
pub mod opencritic;
pub mod playtime;
pub mod source;
pub mod steam;

pub use achievements::AchievementsSource;
pub use hltb::{CompletionEstimates, CompletionTimeSource};
pub use itad::DealSource;
pub use opencritic::{CriticScore, CriticScoreSource};
pub use playtime::PlaytimeSource;
pub use source::{FetchPartial, LookupKey};
pub use steam::{CatalogSource, OwnedGame, SteamStore, SteamWebApi};
