//! Shutdown requested before the run: nothing fetched, output still valid

use std::sync::Arc;
use std::time::Duration;

use steamstats_core::testing::{RecordingSleep, ScriptedGet};
use steamstats_core::{COLUMNS, RetryPolicy, Transport, request_shutdown};
use steamstats_pipeline::{RunContext, RunOptions, Runner};
use steamstats_sources::{CatalogSource, SteamStore};
use tempfile::TempDir;

#[test]
fn interrupted_run_stops_between_identifiers() {
    let http = Arc::new(ScriptedGet::new());
    let transport = Transport::with_parts(
        http.clone(),
        Arc::new(RecordingSleep::default()),
        RetryPolicy::default(),
    );
    let catalog = CatalogSource::new(SteamStore::new(transport.clone()));
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("game_info.csv");
    let options = RunOptions {
        pace: Duration::ZERO,
        output_path: Some(output.clone()),
        ..Default::default()
    };

    request_shutdown();
    let out = Runner::new(catalog, transport, options)
        .run(&RunContext::new(), &[10, 20, 30])
        .unwrap();

    assert!(out.summary.interrupted);
    assert_eq!(out.summary.remaining(), 3);
    assert!(out.records.is_empty());
    assert!(http.requests().is_empty());
    assert_eq!(std::fs::read_to_string(output).unwrap().trim_end(), COLUMNS.join("\t"));
}
