pub mod fetch;
pub mod ids;
pub mod playtime;

use std::path::{Path, PathBuf};

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use steamstats_core::{RetryPolicy, Transport};
use steamstats_sources::SteamWebApi;

use crate::config::{Config, Credentials};

/// A bare file name lands in the export directory; anything with a
/// directory component is used as given.
pub fn output_path(dir: &Path, requested: Option<&Path>, default_name: &str) -> PathBuf {
    match requested {
        Some(path) if path.parent().is_some_and(|p| !p.as_os_str().is_empty()) => path.to_path_buf(),
        Some(path) => dir.join(path),
        None => dir.join(default_name),
    }
}

pub fn web_api(config: &Config, creds: &Credentials, policy: RetryPolicy) -> SteamWebApi {
    SteamWebApi::new(Transport::new(policy), &creds.steam_api_key).with_api_url(&config.steam.api_url)
}

/// Print a key-value summary table on stderr
pub fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}
