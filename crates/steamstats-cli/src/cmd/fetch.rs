//! Fetch subcommand - metadata for a list of identifiers

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use steamstats_core::{SharedProgress, Transport, read_identifiers};
use steamstats_pipeline::{RunContext, RunOptions, Runner};
use steamstats_sources::{
    AchievementsSource, CatalogSource, CompletionTimeSource, CriticScoreSource, DealSource,
    PlaytimeSource, SteamStore, SteamWebApi,
};

use crate::config::{Config, ConfigError, Credentials};

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// File listing the identifiers (tab- or semicolon-separated, with header)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Column holding the identifiers
    #[arg(long, default_value = "appid")]
    pub field: String,

    /// Output file (default: <output.dir>/<output.filename>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write one file per identifier
    #[arg(short, long)]
    pub separate_export: bool,

    /// Query the slow sources too (prices, completion times, critic scores)
    #[arg(short, long)]
    pub extra: bool,

    /// One catalog request per identifier instead of batches
    #[arg(long)]
    pub no_batch: bool,

    /// Steam user (steamID64) for achievements and playtime (default: configured user)
    #[arg(short, long)]
    pub user_id: Option<String>,
}

pub fn run(args: FetchArgs, config: &Config, progress: &SharedProgress, max_attempts: Option<u32>) -> Result<()> {
    let creds = Credentials::resolve(config, args.user_id.as_deref(), false)?;
    run_with(args, config, &creds, progress, max_attempts)
}

/// Credentials a fetch uses, checked before the input is read
#[derive(Debug)]
struct FetchKeys {
    steam_api_key: String,
    user: Option<String>,
    itad_api_key: Option<String>,
}

fn fetch_keys(creds: &Credentials, extra: bool) -> Result<FetchKeys, ConfigError> {
    let itad_api_key = if extra {
        Some(creds.itad()?.to_string())
    } else {
        None
    };
    Ok(FetchKeys {
        steam_api_key: creds.steam_api_key.clone(),
        user: creds.user_id.clone(),
        itad_api_key,
    })
}

fn run_with(
    args: FetchArgs,
    config: &Config,
    creds: &Credentials,
    progress: &SharedProgress,
    max_attempts: Option<u32>,
) -> Result<()> {
    let keys = fetch_keys(creds, args.extra)?;
    let ids = read_identifiers(&args.file, &args.field)?;

    let output_path = super::output_path(
        &config.output.dir,
        args.output.as_deref(),
        &config.output.filename,
    );
    let options = RunOptions {
        extra_data: args.extra,
        use_batch: config.run.use_batch && !args.no_batch,
        batch_size: config.run.batch_size,
        flush_every: config.run.flush_every,
        pace: Duration::from_millis(config.run.pace_ms),
        separate_export: args.separate_export,
        export_dir: config.output.dir.clone(),
        output_path: Some(output_path.clone()),
    };

    log::info!("Fetching {} identifiers", ids.len());
    log::info!("  Input: {}", args.file.display());
    log::info!("  Output: {}", output_path.display());

    let transport = Transport::new(config.retry_policy(max_attempts));
    let steam = &config.steam;
    let store = SteamStore::new(transport.clone()).with_urls(&steam.store_url, &steam.api_url);
    let mut runner =
        Runner::new(CatalogSource::new(store), transport.clone(), options).with_progress(progress.clone());

    match &keys.user {
        Some(user) => {
            runner = runner
                .with_account_source(Box::new(
                    AchievementsSource::new(transport.clone(), &keys.steam_api_key, user)
                        .with_api_url(&steam.api_url),
                ))
                .with_account_source(Box::new(PlaytimeSource::new(
                    SteamWebApi::new(transport.clone(), &keys.steam_api_key).with_api_url(&steam.api_url),
                    user,
                )));
        }
        None => log::info!("No Steam user id configured, skipping achievements and playtime"),
    }

    if let Some(key) = &keys.itad_api_key {
        runner = runner.with_extra_source(Box::new(
            DealSource::new(transport.clone(), key)
                .with_base_url(&config.itad.base_url)
                .with_region(&config.itad.region, &config.itad.country),
        ));
    }
    let min_similarity = config.run.min_name_similarity;
    runner = runner
        .with_extra_source(Box::new(
            CompletionTimeSource::new(transport.clone(), min_similarity)
                .with_base_url(&config.hltb.base_url),
        ))
        .with_extra_source(Box::new(
            CriticScoreSource::new(transport, min_similarity).with_base_url(&config.opencritic.base_url),
        ));

    let output = runner
        .run(&RunContext::new(), &ids)
        .context("Fetch run failed")?;

    if progress.is_tty() {
        progress.println(output.summary.format_table());
    } else {
        output.summary.log();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use steamstats_core::ProgressContext;

    use crate::config::ITAD_API_KEY;

    fn creds(user: Option<&str>, itad: Option<&str>) -> Credentials {
        Credentials {
            steam_api_key: "steam-key".into(),
            user_id: user.map(Into::into),
            itad_api_key: itad.map(Into::into),
        }
    }

    fn args(extra: bool) -> FetchArgs {
        FetchArgs {
            file: PathBuf::from("/nonexistent/ids.csv"),
            field: "appid".into(),
            output: None,
            separate_export: false,
            extra,
            no_batch: false,
            user_id: None,
        }
    }

    #[test]
    fn extra_data_requires_itad_key() {
        let err = fetch_keys(&creds(Some("765"), None), true).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { env_var: ITAD_API_KEY, .. }));

        let keys = fetch_keys(&creds(Some("765"), Some("itad")), true).unwrap();
        assert_eq!(keys.itad_api_key.as_deref(), Some("itad"));
    }

    #[test]
    fn itad_key_unused_without_extra_data() {
        let keys = fetch_keys(&creds(None, Some("itad")), false).unwrap();
        assert_eq!(keys.itad_api_key, None);
        assert_eq!(keys.user, None);
    }

    #[test]
    fn missing_itad_key_fails_before_input_is_read() {
        let progress = Arc::new(ProgressContext::new());
        let err = run_with(args(true), &Config::default(), &creds(Some("765"), None), &progress, None)
            .unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some(), "{err:#}");
    }

    #[test]
    fn input_checked_after_credentials() {
        let progress = Arc::new(ProgressContext::new());
        let err = run_with(args(false), &Config::default(), &creds(None, None), &progress, None)
            .unwrap_err();
        assert!(err.downcast_ref::<steamstats_core::InputError>().is_some(), "{err:#}");
    }
}
