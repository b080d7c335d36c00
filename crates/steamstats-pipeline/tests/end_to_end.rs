//! Full runs against scripted providers

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use steamstats_core::testing::{RecordingSleep, ScriptedGet};
use steamstats_core::{COLUMNS, FieldValue, PartialRecord, RetryPolicy, Transport};
use steamstats_pipeline::{RunContext, RunOptions, Runner};
use steamstats_sources::{
    AchievementsSource, CatalogSource, CompletionTimeSource, FetchPartial, LookupKey, SteamStore,
};
use tempfile::TempDir;

fn details(appid: u64, name: &str) -> String {
    json!({appid.to_string(): {"success": true, "data": {
        "type": "game",
        "name": name,
        "developers": ["Valve"],
        "publishers": ["Valve"],
        "platforms": {"windows": true, "mac": false, "linux": false},
        "genres": [{"description": "Action"}],
        "release_date": {"date": "1 Nov, 2000"}
    }}})
    .to_string()
}

fn reviews() -> String {
    json!({"query_summary": {"num_reviews": 10, "review_score": 8,
        "review_score_desc": "Very Positive", "total_positive": 9,
        "total_negative": 1, "total_reviews": 10}})
    .to_string()
}

struct Harness {
    http: Arc<ScriptedGet>,
    sleep: Arc<RecordingSleep>,
    transport: Transport,
}

impl Harness {
    fn new() -> Self {
        let http = Arc::new(ScriptedGet::new());
        let sleep = Arc::new(RecordingSleep::default());
        let transport = Transport::with_parts(http.clone(), sleep.clone(), RetryPolicy::default());
        Self {
            http,
            sleep,
            transport,
        }
    }

    fn catalog(&self) -> CatalogSource {
        CatalogSource::new(SteamStore::new(self.transport.clone()).with_urls("http://store.test", "http://api.test"))
    }

    fn runner(&self, options: RunOptions) -> Runner {
        Runner::new(self.catalog(), self.transport.clone(), options)
    }
}

fn single_mode(dir: &TempDir) -> RunOptions {
    RunOptions {
        use_batch: false,
        pace: Duration::ZERO,
        export_dir: dir.path().to_path_buf(),
        output_path: Some(dir.path().join("game_info.csv")),
        ..Default::default()
    }
}

#[test]
fn identifier_without_catalog_data_is_skipped() {
    let h = Harness::new();
    h.http.json("appids=10", details(10, "Counter-Strike"));
    h.http.json("appids=20", json!({"20": {"success": false}}).to_string());
    h.http.json("/appreviews/10", reviews());
    let dir = TempDir::new().unwrap();

    let out = h
        .runner(single_mode(&dir))
        .run(&RunContext::new(), &[10, 20])
        .unwrap();

    assert_eq!(out.records.len(), 1);
    let record = &out.records.records()[0];
    assert_eq!(record.appid, 10);
    assert!(!record.export_date.is_empty());
    assert!(!record.export_time.is_empty());
    assert_eq!(out.summary.exported, 1);
    assert_eq!(out.summary.skipped, 1);
    assert_eq!(h.http.calls("/appreviews/10"), 1);
    assert!(h.http.requests().iter().all(|u| !u.contains("/appreviews/20")));

    let content = fs::read_to_string(dir.path().join("game_info.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    let cells: Vec<&str> = lines[1].split('\t').collect();
    let col = |name: &str| cells[COLUMNS.iter().position(|c| *c == name).unwrap()];
    assert_eq!(col("appid"), "10");
    assert_eq!(col("name"), "Counter-Strike");
    assert_eq!(col("url"), "https://store.steampowered.com/app/10");
    assert_eq!(col("export_date"), record.export_date);
    assert_eq!(col("total_positive"), "9");
}

#[test]
fn records_follow_input_order() {
    let h = Harness::new();
    for (id, name) in [(30, "Day of Defeat"), (10, "Counter-Strike"), (20, "Team Fortress")] {
        h.http.json(&format!("appids={id}"), details(id, name));
    }
    h.http.json("/appreviews/", reviews());
    let dir = TempDir::new().unwrap();

    let out = h
        .runner(single_mode(&dir))
        .run(&RunContext::new(), &[30, 10, 20, 10])
        .unwrap();

    let ids: Vec<_> = out.records.records().iter().map(|r| r.appid).collect();
    assert_eq!(ids, vec![30, 10, 20]);
    assert_eq!(out.summary.duplicates, 1);
}

#[test]
fn batch_misses_fall_back_to_single_lookups() {
    let h = Harness::new();
    h.http.json(
        "GetItems",
        json!({"response": {"store_items": [
            {"appid": 10, "success": 1, "name": "Counter-Strike", "type": 0,
             "platforms": {"windows": true, "mac": true, "steamos_linux": true},
             "reviews": {"summary_filtered": {"review_count": 4, "percent_positive": 75}}},
            {"appid": 20, "success": 2}
        ]}})
        .to_string(),
    );
    h.http.json("appids=20", details(20, "Team Fortress Classic"));
    h.http.json("/appreviews/20", reviews());
    let dir = TempDir::new().unwrap();
    let options = RunOptions {
        use_batch: true,
        ..single_mode(&dir)
    };

    let out = h.runner(options).run(&RunContext::new(), &[10, 20]).unwrap();

    assert_eq!(out.records.len(), 2);
    assert_eq!(out.summary.batch_hits, 1);
    assert_eq!(h.http.calls("GetItems"), 1);
    assert_eq!(h.http.calls("appids=20"), 1);
    assert!(h.http.requests().iter().all(|u| !u.contains("appids=10")));
    let first = &out.records.records()[0];
    assert_eq!(first.get("total_positive"), Some(FieldValue::Int(3)));
}

#[test]
fn extra_sources_gated_by_option() {
    let h = Harness::new();
    h.http.json("appids=10", details(10, "Counter-Strike"));
    h.http.json("/appreviews/10", reviews());
    h.http.json(
        "hltb.test",
        json!({"data": [{"game_id": 1, "game_name": "Counter-Strike", "comp_main": 36000}]}).to_string(),
    );
    let dir = TempDir::new().unwrap();
    let hltb = || {
        Box::new(CompletionTimeSource::new(h.transport.clone(), 0.5).with_base_url("http://hltb.test"))
    };

    let out = h
        .runner(single_mode(&dir))
        .with_extra_source(hltb())
        .run(&RunContext::new(), &[10])
        .unwrap();
    assert_eq!(h.http.calls("hltb.test"), 0);
    assert_eq!(out.records.records()[0].get("howlongtobeat_main"), None);

    let options = RunOptions {
        extra_data: true,
        output_path: None,
        ..single_mode(&dir)
    };
    let out = h
        .runner(options)
        .with_extra_source(hltb())
        .run(&RunContext::new(), &[10])
        .unwrap();
    assert_eq!(h.http.calls("hltb.test"), 1);
    assert_eq!(
        out.records.records()[0].get("howlongtobeat_main"),
        Some(FieldValue::Float(10.0))
    );
    assert_eq!(out.summary.source("completion-time").hits, 1);
}

#[test]
fn failing_source_does_not_stop_the_run() {
    let h = Harness::new();
    h.http.json("appids=10", details(10, "Counter-Strike"));
    h.http.json("/appreviews/10", reviews());
    h.http.fail_route("GetPlayerAchievements");
    let dir = TempDir::new().unwrap();
    let achievements = AchievementsSource::new(h.transport.clone(), "KEY", "765").with_api_url("http://api.test");

    let out = h
        .runner(single_mode(&dir))
        .with_account_source(Box::new(achievements))
        .run(&RunContext::new(), &[10])
        .unwrap();

    assert_eq!(out.records.len(), 1);
    assert_eq!(out.summary.source("achievements").misses, 1);
    assert_eq!(h.http.calls("GetPlayerAchievements"), 5);
}

/// Name seen by a name-keyed source
struct EchoName;

impl FetchPartial for EchoName {
    fn source(&self) -> &'static str {
        "echo"
    }

    fn fetch_partial(&self, key: &LookupKey<'_>) -> Option<PartialRecord> {
        let mut record = PartialRecord::new("echo", key.appid);
        record.set("opencritic_name", key.title()?);
        Some(record)
    }
}

#[test]
fn name_keyed_sources_see_catalog_name() {
    let h = Harness::new();
    h.http.json("appids=10", details(10, "  Counter-Strike  "));
    let dir = TempDir::new().unwrap();
    let options = RunOptions {
        extra_data: true,
        ..single_mode(&dir)
    };

    let out = h
        .runner(options)
        .with_extra_source(Box::new(EchoName))
        .run(&RunContext::new(), &[10])
        .unwrap();

    assert_eq!(
        out.records.records()[0].get("opencritic_name"),
        Some(FieldValue::Text("Counter-Strike".into()))
    );
}

#[test]
fn separate_export_and_pacing() {
    let h = Harness::new();
    h.http.json("appids=10", details(10, "Counter-Strike"));
    h.http.json("appids=20", details(20, "Team Fortress Classic"));
    h.http.json("/appreviews/", reviews());
    let dir = TempDir::new().unwrap();
    let options = RunOptions {
        separate_export: true,
        pace: Duration::from_millis(250),
        ..single_mode(&dir)
    };

    h.runner(options).run(&RunContext::new(), &[10, 20]).unwrap();

    assert!(dir.path().join("10_counter-strike.csv").is_file());
    assert!(dir.path().join("20_team-fortress-classic.csv").is_file());
    assert_eq!(h.sleep.slept(), vec![Duration::from_millis(250)]);
}

#[test]
fn existing_output_is_appended() {
    let h = Harness::new();
    h.http.json("appids=10", details(10, "Counter-Strike"));
    h.http.json("/appreviews/10", reviews());
    let dir = TempDir::new().unwrap();

    for _ in 0..2 {
        h.runner(single_mode(&dir)).run(&RunContext::new(), &[10]).unwrap();
    }

    let content = fs::read_to_string(dir.path().join("game_info.csv")).unwrap();
    assert_eq!(content.lines().count(), 3);
}
