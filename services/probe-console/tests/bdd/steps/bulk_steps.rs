//! BDD step definitions for selection and bulk triggering

use std::collections::BTreeMap;

use cucumber::{given, then, when};
use serde_json::{json, Value};

use probe_console::panel::{PanelView, BULK_FAILED_MESSAGE};
use probe_console::{ConsoleError, MonitorKind, Tag};

use crate::world::ConsoleWorld;

fn tag_map(list: &str) -> BTreeMap<String, String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|raw| {
            let tag: Tag = raw.parse().expect("valid tag");
            (tag.key, tag.value)
        })
        .collect()
}

fn run_record(kind: &str, index: usize, success: bool) -> Value {
    let name = format!("run-{}", index);
    match kind {
        "probes" => json!({
            "probe_name": name,
            "timestamp_started": "2024-05-01T10:00:00Z",
            "success": success,
        }),
        _ => json!({
            "story_name": name,
            "timestamp_started": "2024-05-01T10:00:00Z",
            "success": success,
            "step_results": [],
        }),
    }
}

#[given(expr = "the {word} trigger reports {int} run(s) of which {int} failed")]
fn trigger_reports(world: &mut ConsoleWorld, kind: String, runs: usize, failed: usize) {
    let results: Vec<Value> = (0..runs)
        .map(|i| run_record(&kind, i, i >= failed))
        .collect();
    let body = json!({ "triggered_count": runs, "results": results });
    world
        .http()
        .respond(&format!("POST /{}/bulk/trigger", kind), 200, body.to_string());
}

#[given(expr = "the {word} trigger fails with status {int}")]
fn trigger_fails(world: &mut ConsoleWorld, kind: String, status: u16) {
    world
        .http()
        .respond(&format!("POST /{}/bulk/trigger", kind), status, "boom");
}

#[when("the user selects all")]
async fn select_all(world: &mut ConsoleWorld) {
    world.dashboard().select_all().await;
}

#[when(expr = "the user toggles the selection of {word} {string}")]
async fn toggle_selection(world: &mut ConsoleWorld, kind: String, name: String) {
    let kind: MonitorKind = kind.parse().expect("probe or story");
    world.last_flag = Some(world.dashboard().toggle_selection(kind, &name).await);
}

#[when("the user clears the selection")]
async fn clear_selection(world: &mut ConsoleWorld) {
    world.dashboard().clear_selection().await;
}

#[when("the user triggers the selection")]
async fn trigger_selection(world: &mut ConsoleWorld) {
    let dashboard = world.dashboard();
    world.last_result = Some(dashboard.trigger_bulk().await);
}

#[then(expr = "{int} monitor(s) is/are selected")]
async fn selected_count(world: &mut ConsoleWorld, count: usize) {
    let view = world.dashboard().view().await;
    assert_eq!(view.selected_count, count);
}

#[then(expr = "{word} {string} is selected")]
async fn is_selected(world: &mut ConsoleWorld, kind: String, name: String) {
    let kind: MonitorKind = kind.parse().expect("probe or story");
    let state = world.dashboard().state();
    let state = state.read().await;
    assert!(state
        .selection
        .contains(&probe_console::SelectionKey::new(kind, name)));
}

#[then(expr = "a {word} trigger was sent with tags {string}")]
fn trigger_sent(world: &mut ConsoleWorld, kind: String, tags: String) {
    let path = format!("/{}/bulk/trigger", kind);
    let bodies: Vec<Value> = world
        .http()
        .requests()
        .into_iter()
        .filter(|r| r.method == "POST" && r.path == path)
        .filter_map(|r| r.body)
        .collect();
    assert_eq!(bodies, vec![json!({ "tags": tag_map(&tags) })]);
}

#[then(expr = "no {word} trigger was sent")]
fn no_trigger_sent(world: &mut ConsoleWorld, kind: String) {
    let route = format!("POST /{}/bulk/trigger", kind);
    assert!(!world.http().was_requested(&route));
}

#[then("no trigger was sent")]
fn nothing_sent(world: &mut ConsoleWorld) {
    assert!(world.http().requests().iter().all(|r| r.method != "POST"));
}

#[then("the trigger reports an error")]
fn trigger_error(world: &mut ConsoleWorld) {
    let result = world.last_result.as_ref().expect("no trigger attempted");
    assert!(
        matches!(result, Err(ConsoleError::BulkTrigger(_))),
        "expected a bulk trigger error, got {:?}",
        result
    );
}

#[then(expr = "the bulk panel shows {int} triggered, {int} succeeded and {int} failed")]
async fn bulk_panel_summary(
    world: &mut ConsoleWorld,
    triggered: usize,
    succeeded: usize,
    failed: usize,
) {
    let view = world.dashboard().view().await;
    match view.panel.view() {
        PanelView::Bulk { records, summary } => {
            assert_eq!(records.len(), succeeded + failed);
            assert_eq!(summary.triggered_count, triggered);
            assert_eq!(summary.succeeded, succeeded);
            assert_eq!(summary.failed, failed);
        }
        other => panic!("expected bulk results in the panel, got {:?}", other),
    }
}

#[then("the panel shows the bulk failure message")]
async fn bulk_panel_failed(world: &mut ConsoleWorld) {
    let view = world.dashboard().view().await;
    match view.panel.view() {
        PanelView::Failed { message, .. } => assert_eq!(message, BULK_FAILED_MESSAGE),
        other => panic!("expected a failed panel, got {:?}", other),
    }
    assert!(view.panel.records().unwrap_or_default().is_empty());
}
