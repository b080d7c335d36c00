//! Ids subcommand - export identifier lists

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use steamstats_core::{AppId, write_table};
use steamstats_sources::SteamWebApi;

use crate::config::{Config, Credentials};

#[derive(Args, Debug)]
pub struct IdsArgs {
    /// Which list to export
    #[arg(short = 't', long = "type", value_enum, default_value = "owned")]
    pub kind: IdsKind,

    /// Steam user (steamID64)
    #[arg(short, long)]
    pub user_id: Option<String>,

    /// Output file (default: <output.dir>/ids_<type>_<user>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum IdsKind {
    /// Every identifier in the catalog
    All,
    Owned,
    Wishlist,
    /// Owned, then wishlisted
    Both,
}

impl IdsKind {
    fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Owned => "owned",
            Self::Wishlist => "wishlist",
            Self::Both => "both",
        }
    }

    fn needs_user(self) -> bool {
        self != Self::All
    }
}

pub fn run(args: IdsArgs, config: &Config, max_attempts: Option<u32>) -> Result<()> {
    let creds = Credentials::resolve(config, args.user_id.as_deref(), args.kind.needs_user())?;
    let api = super::web_api(config, &creds, config.retry_policy(max_attempts));

    let (ids, default_name) = match creds.user_id.as_deref().filter(|_| args.kind.needs_user()) {
        Some(user) => (
            collect(&api, args.kind, user)?,
            format!("ids_{}_{user}.csv", args.kind.name()),
        ),
        None => (
            api.all_app_ids().context("Failed to fetch the app list")?,
            "ids_all.csv".to_string(),
        ),
    };

    let path = super::output_path(&config.output.dir, args.output.as_deref(), &default_name);
    let rows: Vec<Vec<String>> = ids.iter().map(|id| vec![id.to_string()]).collect();
    write_table(&path, &["appid"], &rows)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    super::print_summary(
        "Identifiers",
        &[
            ("List", args.kind.name().to_string()),
            ("Count", ids.len().to_string()),
            ("Output", path.display().to_string()),
        ],
    );
    Ok(())
}

fn collect(api: &SteamWebApi, kind: IdsKind, user: &str) -> Result<Vec<AppId>> {
    let mut ids = Vec::new();
    if matches!(kind, IdsKind::Owned | IdsKind::Both) {
        let owned = api.owned_games(user).context("Failed to fetch owned games")?;
        ids.extend(owned.into_iter().map(|g| g.appid));
    }
    if matches!(kind, IdsKind::Wishlist | IdsKind::Both) {
        ids.extend(api.wishlist_ids(user).context("Failed to fetch wishlist")?);
    }
    Ok(dedup(ids))
}

/// Drop repeats, keeping first occurrences in order
fn dedup(ids: Vec<AppId>) -> Vec<AppId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
