//! Shutdown arriving while a dependent source waits out a rate limit

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use steamstats_core::testing::ScriptedGet;
use steamstats_core::{COLUMNS, HttpResponse, RetryPolicy, Sleep, Transport, request_shutdown};
use steamstats_pipeline::{RunContext, RunOptions, Runner};
use steamstats_sources::{AchievementsSource, CatalogSource, SteamStore};
use tempfile::TempDir;

/// Every wait is where the user hits Ctrl+C
struct ShutdownOnSleep;

impl Sleep for ShutdownOnSleep {
    fn sleep(&self, _duration: Duration) {
        request_shutdown();
    }
}

#[test]
fn half_filled_record_is_not_exported() {
    let http = Arc::new(ScriptedGet::new());
    http.json(
        "appids=10",
        json!({"10": {"success": true, "data": {"name": "Counter-Strike"}}}).to_string(),
    );
    http.json(
        "/appreviews/10",
        json!({"query_summary": {"total_reviews": 10}}).to_string(),
    );
    http.route("GetPlayerAchievements", vec![HttpResponse::new(429, "")]);
    let transport = Transport::with_parts(http.clone(), Arc::new(ShutdownOnSleep), RetryPolicy::default());
    let catalog = CatalogSource::new(
        SteamStore::new(transport.clone()).with_urls("http://store.test", "http://api.test"),
    );
    let achievements = AchievementsSource::new(transport.clone(), "KEY", "765").with_api_url("http://api.test");
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("game_info.csv");
    let options = RunOptions {
        use_batch: false,
        pace: Duration::ZERO,
        output_path: Some(output.clone()),
        ..Default::default()
    };

    let out = Runner::new(catalog, transport, options)
        .with_account_source(Box::new(achievements))
        .run(&RunContext::new(), &[10, 20])
        .unwrap();

    assert!(out.summary.interrupted);
    assert!(out.records.is_empty());
    assert_eq!(out.summary.exported, 0);
    assert_eq!(out.summary.skipped, 0);
    assert_eq!(out.summary.remaining(), 2);
    assert_eq!(out.summary.source("catalog").hits, 1);
    let achievements = out.summary.source("achievements");
    assert_eq!((achievements.hits, achievements.misses), (0, 0));
    assert_eq!(http.calls("GetPlayerAchievements"), 1);
    assert!(http.requests().iter().all(|u| !u.contains("appids=20")));
    assert_eq!(std::fs::read_to_string(output).unwrap().trim_end(), COLUMNS.join("\t"));
}
