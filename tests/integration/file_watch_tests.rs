//! Integration tests for the manifest watch protocol.
//!
//! Validates:
//! - A change restarts the owning session from the re-read file
//! - A malformed edit keeps the watch so the next save recovers
//! - A deletion stops the owning session and removes the watch
//! - Events from disposed watches are ignored
//! - Sessions sharing a manifest share one watch until the last one stops

use shellherd::host::NoticeLevel;
use shellherd::models::SessionSpec;

use super::test_helpers::Harness;

fn started_api(h: &mut Harness) -> std::path::PathBuf {
    let path = h.write("api/commands.json", r#"{"commands": ["run api"]}"#);
    h.orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect("start");
    path
}

#[test]
fn change_restarts_session_with_new_contents() {
    let mut h = Harness::new("");
    let path = started_api(&mut h);
    let first_id = h.orchestrator.sessions().get("api").expect("running").id();
    let watch = h.live_watch(&path);

    h.write("api/commands.json", r#"{"commands": ["run api --v2", "tail log"]}"#);
    h.fire_change(&path, watch);

    let entry = h.orchestrator.sessions().get("api").expect("restarted");
    assert_ne!(entry.id(), first_id);
    assert_eq!(h.inputs("api"), vec!["run api --v2", "tail log"]);
    assert!(h.terminals.lock().unwrap().disposed.contains(&first_id));
    assert!(h.noticed(NoticeLevel::Info, "restarting"));

    // The restart re-armed the path with a fresh watch.
    let rearmed = h.live_watch(&path);
    assert_ne!(rearmed, watch);
}

#[test]
fn malformed_edit_keeps_watch_and_next_save_restarts() {
    let mut h = Harness::new("");
    let path = started_api(&mut h);
    let watch = h.live_watch(&path);

    h.write("api/commands.json", "{ not json");
    h.fire_change(&path, watch);

    assert!(h.running().is_empty());
    assert!(h.noticed(NoticeLevel::Error, "manifest"));
    assert_eq!(h.live_watch(&path), watch);
    assert_eq!(h.orchestrator.watches().owners(&path), vec!["api"]);

    h.write("api/commands.json", r#"{"commands": ["run api --fixed"]}"#);
    h.fire_change(&path, watch);

    assert_eq!(h.running(), vec!["api"]);
    assert_eq!(h.inputs("api"), vec!["run api --fixed"]);
    assert_ne!(h.live_watch(&path), watch);
}

#[test]
fn explicit_stop_after_failed_restart_drops_watch() {
    let mut h = Harness::new("");
    let path = started_api(&mut h);
    let watch = h.live_watch(&path);
    h.write("api/commands.json", "{ not json");
    h.fire_change(&path, watch);

    h.orchestrator.stop("api");

    assert!(!h.orchestrator.watches().contains(&path));
}

#[test]
fn deletion_stops_session_and_removes_watch() {
    let mut h = Harness::new("");
    let path = started_api(&mut h);
    let watch = h.live_watch(&path);

    std::fs::remove_file(&path).expect("remove");
    h.fire_delete(&path, watch);

    assert!(h.running().is_empty());
    assert!(!h.orchestrator.watches().contains(&path));
    assert!(h.noticed(NoticeLevel::Warning, "was deleted"));
}

#[test]
fn events_from_stale_watch_are_ignored() {
    let mut h = Harness::new("");
    let path = started_api(&mut h);
    let stale = h.live_watch(&path);
    h.fire_change(&path, stale);
    let live_id = h.orchestrator.sessions().get("api").expect("running").id();

    // A late duplicate from the first arming must not restart again.
    h.fire_change(&path, stale);
    h.fire_delete(&path, stale);

    assert_eq!(
        h.orchestrator.sessions().get("api").expect("still running").id(),
        live_id
    );
    assert!(h.orchestrator.watches().contains(&path));
}

#[test]
fn change_after_stop_does_nothing() {
    let mut h = Harness::new("");
    let path = started_api(&mut h);
    let watch = h.live_watch(&path);
    h.orchestrator.stop("api");

    h.fire_change(&path, watch);

    assert!(h.running().is_empty());
}

#[test]
fn shared_manifest_keeps_one_watch() {
    let mut h = Harness::new("");
    let path = started_api(&mut h);
    h.orchestrator
        .start(&SessionSpec::with_location("api-copy", "api/./commands.json"))
        .expect("start second");

    assert_eq!(h.orchestrator.watches().len(), 1);
    assert_eq!(h.watches.lock().unwrap().live_for(&path).len(), 1);
    assert_eq!(h.orchestrator.watches().owners(&path), vec!["api", "api-copy"]);
}

fn started_pair(h: &mut Harness) -> std::path::PathBuf {
    let path = started_api(h);
    h.orchestrator
        .start(&SessionSpec::with_location("api-copy", "api/commands.json"))
        .expect("start second");
    path
}

#[test]
fn stopping_one_sharer_keeps_watch_for_the_other() {
    let mut h = Harness::new("");
    let path = started_pair(&mut h);

    h.orchestrator.stop("api-copy");

    assert_eq!(h.running(), vec!["api"]);
    assert_eq!(h.orchestrator.watches().owners(&path), vec!["api"]);
    let watch = h.live_watch(&path);

    // The remaining session still follows its manifest.
    h.write("api/commands.json", r#"{"commands": ["run api --v2"]}"#);
    h.fire_change(&path, watch);
    assert_eq!(h.inputs("api"), vec!["run api --v2"]);

    h.orchestrator.stop("api");
    assert!(h.orchestrator.watches().is_empty());
}

#[test]
fn shared_manifest_change_restarts_every_sharer() {
    let mut h = Harness::new("");
    let path = started_pair(&mut h);
    let watch = h.live_watch(&path);

    h.write("api/commands.json", r#"{"commands": ["run api --v2"]}"#);
    h.fire_change(&path, watch);

    assert_eq!(h.running(), vec!["api", "api-copy"]);
    assert_eq!(h.inputs("api"), vec!["run api --v2"]);
    assert_eq!(h.inputs("api-copy"), vec!["run api --v2"]);
    h.live_watch(&path);
}

#[test]
fn shared_manifest_deletion_stops_every_sharer() {
    let mut h = Harness::new("");
    let path = started_pair(&mut h);
    let watch = h.live_watch(&path);

    std::fs::remove_file(&path).expect("remove");
    h.fire_delete(&path, watch);

    assert!(h.running().is_empty());
    assert!(h.orchestrator.watches().is_empty());
}
