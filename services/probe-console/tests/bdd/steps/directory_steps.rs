//! BDD step definitions for the monitor directory feature

use cucumber::{given, then, when};
use serde_json::{json, Value};

use probe_console::directory::LOAD_FAILED_MESSAGE;
use probe_console::state::GridStatus;
use probe_console::Tag;

use crate::world::ConsoleWorld;

fn parse_tags(list: &str) -> Value {
    let mut tags = serde_json::Map::new();
    for raw in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let tag: Tag = raw.parse().expect("valid tag");
        tags.insert(tag.key, Value::String(tag.value));
    }
    Value::Object(tags)
}

fn listing_entry(name: &str, tags: Value) -> Value {
    json!({
        "name": name,
        "status": "OK",
        "last_probed": "2024-05-01T10:00:00Z",
        "tags": tags,
    })
}

/// Serve the current probe and story lists from the scripted API
pub fn publish(world: &mut ConsoleWorld) {
    let http = world.http();
    http.respond("GET /probes", 200, Value::Array(world.probes.clone()).to_string());
    http.respond(
        "GET /stories",
        200,
        Value::Array(world.stories.clone()).to_string(),
    );
}

#[given(expr = "a probe {string} tagged {string}")]
fn probe_tagged(world: &mut ConsoleWorld, name: String, tags: String) {
    world.probes.push(listing_entry(&name, parse_tags(&tags)));
    publish(world);
}

#[given(expr = "a probe {string} with null tags")]
fn probe_null_tags(world: &mut ConsoleWorld, name: String) {
    world.probes.push(listing_entry(&name, Value::Null));
    publish(world);
}

#[given(expr = "a story {string} tagged {string}")]
fn story_tagged(world: &mut ConsoleWorld, name: String, tags: String) {
    world.stories.push(listing_entry(&name, parse_tags(&tags)));
    publish(world);
}

#[given("no monitors are configured")]
fn no_monitors(world: &mut ConsoleWorld) {
    world.probes.clear();
    world.stories.clear();
    publish(world);
}

#[given(expr = "the {word} listing fails with status {int}")]
fn listing_fails(world: &mut ConsoleWorld, kind: String, status: u16) {
    world
        .http()
        .respond(&format!("GET /{}", kind), status, "upstream error");
}

#[given("the monitoring API is unreachable")]
fn api_unreachable(world: &mut ConsoleWorld) {
    let http = world.http();
    http.fail("GET /probes", "connection refused");
    http.fail("GET /stories", "connection refused");
}

#[given("the dashboard has loaded")]
async fn dashboard_loaded(world: &mut ConsoleWorld) {
    world.dashboard().load().await.expect("directory load");
}

#[when("the dashboard loads")]
async fn dashboard_loads(world: &mut ConsoleWorld) {
    let dashboard = world.dashboard();
    world.last_result = Some(dashboard.load().await);
}

#[then("the load succeeds")]
fn load_succeeds(world: &mut ConsoleWorld) {
    let result = world.last_result.as_ref().expect("no load attempted");
    assert!(result.is_ok(), "expected load to succeed, got {:?}", result);
}

#[then("the load reports an error")]
fn load_fails(world: &mut ConsoleWorld) {
    let result = world.last_result.as_ref().expect("no load attempted");
    assert!(
        matches!(result, Err(probe_console::ConsoleError::DirectoryLoad(_))),
        "expected a directory load error, got {:?}",
        result
    );
}

#[then(expr = "the grid shows {int} of {int} monitors")]
async fn grid_shows(world: &mut ConsoleWorld, visible: usize, total: usize) {
    let view = world.dashboard().view().await;
    assert_eq!(view.grid, GridStatus::Showing { visible, total });
    assert_eq!(view.monitors.len(), visible);
}

#[then("the grid reports a load failure")]
async fn grid_load_failure(world: &mut ConsoleWorld) {
    let view = world.dashboard().view().await;
    assert_eq!(view.grid, GridStatus::LoadFailed(LOAD_FAILED_MESSAGE.to_string()));
}

#[then("the grid reports that no monitors are configured")]
async fn grid_empty_install(world: &mut ConsoleWorld) {
    let view = world.dashboard().view().await;
    assert_eq!(view.grid, GridStatus::NoMonitorsConfigured);
}

#[then("no monitors are listed")]
async fn no_monitors_listed(world: &mut ConsoleWorld) {
    let view = world.dashboard().view().await;
    assert!(view.monitors.is_empty());
    assert!(view.vocabulary.is_empty());
}

#[then(expr = "probe {string} has no tags")]
async fn probe_has_no_tags(world: &mut ConsoleWorld, name: String) {
    let view = world.dashboard().view().await;
    let monitor = view
        .monitors
        .iter()
        .find(|m| m.item.name == name)
        .expect("monitor not listed");
    assert!(monitor.item.tags.is_empty());
}

#[then(expr = "the tag vocabulary offers {string} for {string}")]
async fn vocabulary_offers(world: &mut ConsoleWorld, values: String, key: String) {
    let view = world.dashboard().view().await;
    let offered: Vec<String> = view
        .vocabulary
        .get(&key)
        .map(|set| set.iter().cloned().collect())
        .unwrap_or_default();
    let expected: Vec<String> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    assert_eq!(offered, expected);
}
