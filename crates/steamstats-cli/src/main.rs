//! steamstats - game metadata from Steam and auxiliary providers
//!
//! Reads a list of app identifiers, fetches catalog, review, achievement,
//! playtime and (optionally) price/completion-time/critic data, and writes
//! one tab-separated row per game.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use steamstats_core::{InputError, is_shutdown_requested};

mod cmd;
mod config;

use config::{Config, ConfigError, Credentials};

#[derive(Parser)]
#[command(name = "steamstats")]
#[command(about = "Collect game metadata from Steam and related services")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(long, global = true, conflicts_with = "debug")]
    quiet: bool,

    /// Config file path (default: ./steamstats.toml or ~/.config/steamstats/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Maximum attempts for server errors and connection failures
    #[arg(long, global = true)]
    max_attempts: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch metadata for the identifiers listed in a file
    Fetch(cmd::fetch::FetchArgs),
    /// Export identifier lists (catalog, owned, wishlist)
    Ids(cmd::ids::IdsArgs),
    /// Export playtime of owned games
    Playtime(cmd::playtime::PlaytimeArgs),
    /// Show current configuration
    Config,
}

/// Exit code for configuration and input errors
const EXIT_USAGE: u8 = 2;
/// Exit code after SIGINT/SIGTERM
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(steamstats_core::ProgressContext::new());

    // Logging:
    //   TTY:     warn unless --debug, the progress bar shows activity
    //   non-TTY: info unless --debug or --quiet
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = cli.quiet || (is_tty && !cli.debug);
    steamstats_core::init_logging(quiet, cli.debug, multi);

    if let Err(e) = steamstats_core::install_signal_handlers() {
        log::warn!("Failed to install signal handlers: {e}");
    }

    match run(cli, &progress) {
        Ok(()) if is_shutdown_requested() => {
            log::warn!("Interrupted; rows written so far were kept");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            if is_usage_error(&e) {
                ExitCode::from(EXIT_USAGE)
            } else if is_shutdown_requested() {
                ExitCode::from(EXIT_INTERRUPTED)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn is_usage_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ConfigError>().is_some() || e.downcast_ref::<InputError>().is_some()
}

fn run(cli: Cli, progress: &steamstats_core::SharedProgress) -> Result<()> {
    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };
    steamstats_core::set_http_config(config.http_config());

    match cli.command {
        Command::Fetch(args) => cmd::fetch::run(args, &config, progress, cli.max_attempts),
        Command::Ids(args) => cmd::ids::run(args, &config, cli.max_attempts),
        Command::Playtime(args) => cmd::playtime::run(args, &config, cli.max_attempts),
        Command::Config => {
            show_config(&config, cli.max_attempts);
            Ok(())
        }
    }
}

fn show_config(config: &Config, max_attempts: Option<u32>) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let creds = Credentials::resolve(config, None, false).ok();
    let status = |set: bool| if set { "configured" } else { "not set" };
    let policy = config.retry_policy(max_attempts);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["Steam API key", status(creds.is_some())]);
    table.add_row(vec![
        "Steam user id",
        creds
            .as_ref()
            .and_then(|c| c.user_id.as_deref())
            .unwrap_or("not set"),
    ]);
    table.add_row(vec![
        "ITAD API key",
        status(creds.as_ref().is_some_and(|c| c.itad_api_key.is_some())),
    ]);
    table.add_row(vec!["Store URL", &config.steam.store_url]);
    table.add_row(vec!["API URL", &config.steam.api_url]);
    table.add_row(vec![
        "ITAD",
        &format!(
            "{} ({}/{})",
            config.itad.base_url, config.itad.region, config.itad.country
        ),
    ]);
    table.add_row(vec!["HowLongToBeat URL", &config.hltb.base_url]);
    table.add_row(vec!["OpenCritic URL", &config.opencritic.base_url]);
    table.add_row(vec![
        "Retries",
        &format!(
            "{} attempts, {:?} base delay",
            policy.max_attempts, policy.base_delay
        ),
    ]);
    table.add_row(vec![
        "Rate limit backoff",
        &format!(
            "{:?} +{:?} ({})",
            policy.rate_limit_delay,
            policy.rate_limit_step,
            policy
                .max_rate_limit_retries
                .map_or("unbounded".to_string(), |n| format!("max {n}"))
        ),
    ]);
    table.add_row(vec![
        "Batch",
        &if config.run.use_batch {
            format!("{} per request", config.run.batch_size)
        } else {
            "off".to_string()
        },
    ]);
    table.add_row(vec!["Pacing", &format!("{}ms", config.run.pace_ms)]);
    table.add_row(vec![
        "Min name similarity",
        &format!("{:.2}", config.run.min_name_similarity),
    ]);
    table.add_row(vec![
        "Output",
        &config.output.dir.join(&config.output.filename).display().to_string(),
    ]);

    eprintln!("\n{table}");
}
