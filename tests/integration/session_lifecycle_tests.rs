//! Integration tests for starting and stopping configured sessions.
//!
//! Validates:
//! - Inline commands are fed in order with no watch installed
//! - Manifest-sourced sessions read the file and arm one watch
//! - A second start of a live name changes nothing
//! - Stop is idempotent and releases the session's watch
//! - Failed starts leave no session or watch behind
//! - Host-reported closure unregisters only the live instance

use shellherd::events::Event;
use shellherd::host::NoticeLevel;
use shellherd::models::{SessionId, SessionSpec};
use shellherd::orchestrator::StartOutcome;
use shellherd::AppError;

use super::test_helpers::Harness;

// ── Inline commands ─────────────────────────────────

#[test]
fn inline_commands_are_fed_in_order_without_watch() {
    let mut h = Harness::new("");
    let spec = SessionSpec::with_commands("web", ["run build", "run serve"]);

    let outcome = h.orchestrator.start(&spec).expect("start");

    assert!(matches!(outcome, StartOutcome::Started(_)));
    assert_eq!(h.running(), vec!["web"]);
    assert_eq!(h.inputs("web"), vec!["run build", "run serve"]);
    assert!(h.orchestrator.watches().is_empty());

    let log = h.terminals.lock().unwrap();
    let request = log.latest("web").expect("created");
    assert_eq!(log.shown, vec![request.id]);
    assert_eq!(request.working_dir.as_deref(), Some(h.root().as_path()));
}

#[test]
fn inline_commands_win_over_location() {
    let mut h = Harness::new("");
    let mut spec = SessionSpec::with_commands("web", ["echo inline"]);
    spec.location = Some("web/commands.json".into());

    h.orchestrator.start(&spec).expect("start");

    assert_eq!(h.inputs("web"), vec!["echo inline"]);
    assert!(h.orchestrator.watches().is_empty());
}

// ── Manifest-sourced commands ───────────────────────

#[test]
fn manifest_session_reads_file_and_arms_watch() {
    let mut h = Harness::new("");
    let path = h.write("api/commands.json", r#"{"commands": ["run api"]}"#);

    h.orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect("start");

    assert_eq!(h.inputs("api"), vec!["run api"]);
    assert_eq!(h.orchestrator.watches().paths(), vec![path.clone()]);
    assert_eq!(h.orchestrator.watches().owners(&path), vec!["api"]);
    h.live_watch(&path);
}

#[test]
fn absolute_location_is_used_as_is() {
    let mut h = Harness::new("");
    let path = h.write("elsewhere/c.json", r#"{"commands": ["x"]}"#);

    h.orchestrator
        .start(&SessionSpec::with_location("abs", &path))
        .expect("start");

    assert!(h.orchestrator.watches().contains(&path));
}

#[test]
fn malformed_manifest_aborts_cleanly() {
    let mut h = Harness::new("");
    h.write("api/commands.json", r#"{"commands": "run api"}"#);

    let err = h
        .orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect_err("shape mismatch");

    assert!(matches!(err, AppError::Manifest(_)));
    assert!(h.running().is_empty());
    assert!(h.orchestrator.watches().is_empty());
    assert!(h.terminals.lock().unwrap().created.is_empty());
}

#[test]
fn missing_manifest_aborts_cleanly() {
    let mut h = Harness::new("");
    let err = h
        .orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect_err("missing file");
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(h.running().is_empty());
}

#[test]
fn relative_location_without_root_is_rejected() {
    let mut h = Harness::without_root("");
    let err = h
        .orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect_err("no root");
    assert!(matches!(err, AppError::NoWorkspace(_)));
    assert!(h.running().is_empty());
}

#[test]
fn spec_without_commands_or_location_is_a_warning() {
    let mut h = Harness::new("");
    let spec = SessionSpec::with_commands("idle", Vec::<String>::new());

    assert!(h.orchestrator.start_and_report(&spec).is_none());

    assert!(h.noticed(NoticeLevel::Warning, "neither commands nor location"));
    assert!(h.running().is_empty());
}

#[test]
fn watch_failure_rolls_back_the_session() {
    let mut h = Harness::new("");
    h.write("api/commands.json", r#"{"commands": ["run api"]}"#);
    h.watches.lock().unwrap().refuse = true;

    let err = h
        .orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect_err("watch refused");

    assert!(matches!(err, AppError::Watch(_)));
    assert!(h.running().is_empty());
    let log = h.terminals.lock().unwrap();
    let created = log.latest("api").expect("was created before rollback");
    assert_eq!(log.disposed, vec![created.id]);
}

#[test]
fn terminal_failure_installs_no_watch() {
    let mut h = Harness::new("");
    h.write("api/commands.json", r#"{"commands": ["run api"]}"#);
    h.terminals.lock().unwrap().fail_next = Some("no pty".into());

    let err = h
        .orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect_err("terminal refused");

    assert!(matches!(err, AppError::Terminal(_)));
    assert!(h.running().is_empty());
    assert!(h.orchestrator.watches().is_empty());
}

// ── Uniqueness ──────────────────────────────────────

#[test]
fn second_start_of_live_name_changes_nothing() {
    let mut h = Harness::new("");
    let spec = SessionSpec::with_commands("web", ["run serve"]);
    h.orchestrator.start(&spec).expect("start");

    let outcome = h.orchestrator.start_and_report(&spec);

    assert_eq!(outcome, Some(StartOutcome::AlreadyRunning));
    assert_eq!(h.terminals.lock().unwrap().created_count("web"), 1);
    assert_eq!(h.inputs("web"), vec!["run serve"]);
    assert!(h.noticed(NoticeLevel::Info, "Session 'web' is already running."));
}

#[test]
fn name_is_reusable_after_stop() {
    let mut h = Harness::new("");
    let spec = SessionSpec::with_commands("web", ["run serve"]);
    h.orchestrator.start(&spec).expect("start");
    h.orchestrator.stop("web");

    let outcome = h.orchestrator.start(&spec).expect("restart");

    assert!(matches!(outcome, StartOutcome::Started(_)));
    assert_eq!(h.terminals.lock().unwrap().created_count("web"), 2);
}

// ── Stop ────────────────────────────────────────────

#[test]
fn stop_is_idempotent() {
    let mut h = Harness::new("");
    h.orchestrator
        .start(&SessionSpec::with_commands("web", ["x"]))
        .expect("start");

    assert!(h.orchestrator.stop("web"));
    assert!(!h.orchestrator.stop("web"));
    assert!(!h.orchestrator.stop("never-started"));

    assert!(h.running().is_empty());
    assert_eq!(h.terminals.lock().unwrap().disposed.len(), 1);
}

#[test]
fn stop_disposes_the_sessions_watch() {
    let mut h = Harness::new("");
    let path = h.write("api/commands.json", r#"{"commands": ["run api"]}"#);
    h.orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect("start");
    let watch = h.live_watch(&path);

    h.orchestrator.stop("api");

    assert!(h.orchestrator.watches().is_empty());
    assert!(h.watches.lock().unwrap().disposed.contains(&watch));
}

// ── Host closure ────────────────────────────────────

#[test]
fn host_closure_unregisters_session_and_watch() {
    let mut h = Harness::new("");
    let path = h.write("api/commands.json", r#"{"commands": ["run api"]}"#);
    h.orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect("start");
    let id = h.orchestrator.sessions().get("api").expect("running").id();

    h.orchestrator.handle_event(Event::SessionClosed {
        name: "api".into(),
        id,
    });

    assert!(h.running().is_empty());
    assert!(!h.orchestrator.watches().contains(&path));
}

#[test]
fn closure_of_previous_instance_is_ignored() {
    let mut h = Harness::new("");
    let spec = SessionSpec::with_commands("web", ["x"]);
    h.orchestrator.start(&spec).expect("start");
    let old = h.orchestrator.sessions().get("web").expect("running").id();
    h.orchestrator.stop("web");
    h.orchestrator.start(&spec).expect("restart");

    h.orchestrator.handle_event(Event::SessionClosed {
        name: "web".into(),
        id: old,
    });
    h.orchestrator.handle_event(Event::SessionClosed {
        name: "web".into(),
        id: SessionId::new(),
    });

    assert_eq!(h.running(), vec!["web"]);
}

#[test]
fn teardown_disposes_everything() {
    let mut h = Harness::new("");
    let path = h.write("api/commands.json", r#"{"commands": ["run api"]}"#);
    h.orchestrator
        .start(&SessionSpec::with_location("api", "api/commands.json"))
        .expect("start");
    h.orchestrator
        .start(&SessionSpec::with_commands("web", ["x"]))
        .expect("start");
    let watch = h.live_watch(&path);

    h.orchestrator.teardown();

    assert!(h.running().is_empty());
    assert!(h.orchestrator.watches().is_empty());
    assert_eq!(h.terminals.lock().unwrap().disposed.len(), 2);
    assert!(h.watches.lock().unwrap().disposed.contains(&watch));
}
