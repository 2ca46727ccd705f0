//! Scripted headless runs, end to end through the NDJSON writer

use std::io::Cursor;

use lockscreen_widgets::headless::runner::{headless_event_loop, spawn_line_reader};
use lsw_app::{Engine, Settings};
use serde_json::Value;
use tempfile::tempdir;

async fn run_script(script: &'static str) -> Vec<Value> {
    let temp = tempdir().unwrap();
    let mut settings = Settings::default();
    settings.preferences.watch = false;
    let mut engine = Engine::with_settings(temp.path().to_path_buf(), settings).unwrap();

    spawn_line_reader(Cursor::new(script), engine.msg_sender());

    let mut out = Vec::new();
    headless_event_loop(&mut engine, &mut out).await.unwrap();

    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn events_named<'a>(lines: &'a [Value], name: &str) -> Vec<&'a Value> {
    lines.iter().filter(|v| v["event"] == name).collect()
}

#[tokio::test]
async fn test_script_opens_drawer_and_reports_state() {
    let lines = run_script(
        "# open the drawer and look at it\n\
         show\n\
         tick 200\n\
         state\n",
    )
    .await;

    assert_eq!(lines[0]["event"], "service_connected");
    assert!(lines.iter().all(|v| v["timestamp"].is_number()));

    let bus: Vec<&str> = events_named(&lines, "bus")
        .iter()
        .filter_map(|v| v["payload"]["type"].as_str())
        .collect();
    assert!(bus.contains(&"show_drawer"));
    assert!(bus.contains(&"drawer_shown"));

    let states = events_named(&lines, "state");
    assert_eq!(states.len(), 1);
    assert_eq!(states[0]["report"]["running"], true);
    assert_eq!(states[0]["report"]["drawer"]["attached"], true);
}

#[tokio::test]
async fn test_bad_lines_are_reported_and_skipped() {
    let lines = run_script("dance\nshow\n").await;

    let errors = events_named(&lines, "error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["line"], 1);
    assert_eq!(errors[0]["fatal"], false);
    assert!(errors[0]["message"].as_str().unwrap().contains("dance"));

    assert!(events_named(&lines, "bus")
        .iter()
        .any(|v| v["payload"]["type"] == "show_drawer"));
}

#[tokio::test]
async fn test_quit_stops_before_remaining_lines() {
    let lines = run_script("quit\nshow\n").await;

    assert!(!events_named(&lines, "bus")
        .iter()
        .any(|v| v["payload"]["type"] == "show_drawer"));
}
