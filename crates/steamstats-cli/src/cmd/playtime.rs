//! Playtime subcommand - owned games with time played per platform

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use steamstats_core::write_table;
use steamstats_sources::OwnedGame;

use crate::config::{Config, Credentials};

#[derive(Args, Debug)]
pub struct PlaytimeArgs {
    /// Steam user (steamID64)
    #[arg(short, long)]
    pub user_id: Option<String>,

    /// Output file (default: <output.dir>/playtime_<user>.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

const HEADER: &[&str] = &[
    "appid",
    "name",
    "playtime_forever",
    "playtime_windows",
    "playtime_mac",
    "playtime_linux",
];

pub fn run(args: PlaytimeArgs, config: &Config, max_attempts: Option<u32>) -> Result<()> {
    let creds = Credentials::resolve(config, args.user_id.as_deref(), true)?;
    let user = creds.user()?;
    let api = super::web_api(config, &creds, config.retry_policy(max_attempts));

    let games = api.owned_games(user).context("Failed to fetch owned games")?;
    let path = super::output_path(
        &config.output.dir,
        args.output.as_deref(),
        &format!("playtime_{user}.csv"),
    );
    let rows: Vec<Vec<String>> = games.iter().map(row).collect();
    write_table(&path, HEADER, &rows).with_context(|| format!("Failed to write {}", path.display()))?;

    let total_minutes: i64 = games.iter().map(|g| g.playtime_forever).sum();
    super::print_summary(
        "Playtime",
        &[
            ("Games", games.len().to_string()),
            ("Total", format!("{:.1}h", total_minutes as f64 / 60.0)),
            ("Output", path.display().to_string()),
        ],
    );
    Ok(())
}

fn row(game: &OwnedGame) -> Vec<String> {
    vec![
        game.appid.to_string(),
        game.name.clone().unwrap_or_default(),
        game.playtime_forever.to_string(),
        game.playtime_windows.to_string(),
        game.playtime_mac.to_string(),
        game.playtime_linux.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_matches_header() {
        let game = OwnedGame {
            appid: 70,
            name: None,
            playtime_forever: 90,
            playtime_windows: 90,
            playtime_mac: 0,
            playtime_linux: 0,
        };
        let r = row(&game);
        assert_eq!(r.len(), HEADER.len());
        assert_eq!(r[0], "70");
        assert_eq!(r[1], "");
    }
}
