//! Integration tests for osabridge
//!
//! These tests drive the tool surface end to end over a replaying script
//! runner, so they run without macOS.

use chrono::NaiveDateTime;
use osabridge::adapters::FixedClock;
use osabridge::core::MCPServer;
use osabridge::osa::codec::{encode, encode_batch, WireField};
use osabridge::osa::{Application, ReplayRunner};
use osabridge::{Bridge, ToolRegistry};
use serde_json::{json, Value};
use std::sync::Arc;

fn now() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2026-10-19T09:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn registry(runner: Arc<ReplayRunner>) -> ToolRegistry {
    let bridge = Bridge::with_clock(runner, "Work", Arc::new(FixedClock(now())));
    ToolRegistry::for_bridge(&bridge)
}

fn event(summary: &str, start: &str, end: &str, description: &str) -> Vec<WireField> {
    vec![
        summary.into(),
        start.into(),
        end.into(),
        "Work".into(),
        description.into(),
        "".into(),
        "".into(),
    ]
}

#[tokio::test]
async fn test_search_events_finds_standup_case_insensitively() {
    let stdout = encode_batch(&[
        event("Standup", "2026-10-20T09:30:00", "2026-10-20T09:45:00", ""),
        event("Lunch", "2026-10-20T12:00:00", "2026-10-20T13:00:00", "no agenda"),
    ]);
    let runner = Arc::new(ReplayRunner::new().reply(stdout));
    let registry = registry(runner.clone());

    let result = registry
        .call("calendar_search_events", json!({"query": "stand"}))
        .await;

    assert!(result.success, "{}", result.text());
    assert!(result.output.contains("\"summary\": \"Standup\""));
    assert!(!result.output.contains("Lunch"));

    let script = runner.last_script().unwrap();
    assert_eq!(script.application, Application::Calendar);
    assert_eq!(
        script.values(),
        vec!["Work", "stand", "2026-10-19T09:00:00", "2027-01-17T09:00:00"]
    );
}

#[tokio::test]
async fn test_list_events_drops_events_outside_window() {
    let stdout = encode_batch(&[
        event("Past", "2026-10-18T10:00:00", "2026-10-18T11:00:00", ""),
        event("Edge", "2026-10-26T09:00:00", "2026-10-26T10:00:00", ""),
        event("Later", "2026-10-26T09:00:01", "2026-10-26T10:00:00", ""),
    ]);
    let registry = registry(Arc::new(ReplayRunner::new().reply(stdout)));

    let result = registry.call("calendar_list_events", json!({})).await;

    assert!(result.output.starts_with("1 events in \"Work\""));
    assert!(result.output.contains("Edge"));
    assert!(!result.output.contains("Past"));
    assert!(!result.output.contains("Later"));
}

#[tokio::test]
async fn test_contact_without_organization() {
    let row = vec![
        WireField::text("p-42"),
        WireField::text("Jane Doe"),
        WireField::list(["jane@example.com", "j.doe@example.org"]),
        WireField::list(["555-0100"]),
        WireField::text(""),
        WireField::text("1990-04-01"),
    ];
    let registry = registry(Arc::new(ReplayRunner::new().reply(encode(&row))));

    let result = registry.call("contacts_get", json!({"name": "Jane Doe"})).await;
    assert!(result.success);

    let json_start = result.output.find('{').unwrap();
    let contact: Value = serde_json::from_str(&result.output[json_start..]).unwrap();
    assert_eq!(contact["emails"], json!(["jane@example.com", "j.doe@example.org"]));
    assert_eq!(contact["birthday"], "1990-04-01");
    assert!(contact.get("organization").is_none());
}

#[tokio::test]
async fn test_note_title_with_delimiters_survives() {
    let title = "Plan ||| A ::: B, C";
    let row = vec![
        WireField::text("n-1"),
        WireField::text(title),
        WireField::text("body"),
    ];
    let runner = Arc::new(ReplayRunner::new().reply(encode(&row)));
    let registry = registry(runner.clone());

    let result = registry.call("notes_get", json!({"title": title})).await;

    assert!(result.success);
    assert!(result.output.starts_with(&format!("Note \"{}\":", title)));
    assert_eq!(runner.last_script().unwrap().values(), vec![title]);
}

#[tokio::test]
async fn test_process_failure_becomes_error_text() {
    let registry = registry(Arc::new(
        ReplayRunner::new().fail_exit(1, "Contacts got an error: not allowed"),
    ));

    let result = registry.call("contacts_list", json!({})).await;

    assert!(!result.success);
    let text = result.text();
    assert!(text.starts_with("Error: "));
    assert!(text.contains("not allowed"));
}

#[tokio::test]
async fn test_mcp_round_trip_over_serve() {
    let runner = Arc::new(ReplayRunner::new().reply(encode_batch(&[
        vec![WireField::text("Work")],
        vec![WireField::text("Home")],
    ])));
    let server = MCPServer::new(Arc::new(registry(runner)));

    let input = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
               "params": {"name": "calendar_list_calendars", "arguments": {}}}),
    ]
    .iter()
    .map(Value::to_string)
    .collect::<Vec<_>>()
    .join("\n");

    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    let replies: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(replies[1]["result"]["isError"], false);
    let text = replies[1]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("\"Home\""));
}
