//! Unit tests for `SessionRegistry` admission and release.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use shellherd::host::Terminal;
use shellherd::models::SessionTag;
use shellherd::orchestrator::{Admission, SessionRegistry};
use shellherd::AppError;

/// Terminal that counts how often it was disposed.
struct CountingTerminal {
    disposed: Arc<AtomicUsize>,
}

impl Terminal for CountingTerminal {
    fn show(&mut self) {}
    fn send_text(&mut self, _text: &str) {}
    fn dispose(&mut self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

fn terminal(counter: &Arc<AtomicUsize>) -> Box<dyn Terminal> {
    Box::new(CountingTerminal {
        disposed: Arc::clone(counter),
    })
}

#[test]
fn first_admission_creates() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let mut registry = SessionRegistry::new();

    let admission = registry
        .try_create("api", SessionTag::Configured, |_| Ok(terminal(&disposed)))
        .expect("create");

    assert!(matches!(admission, Admission::Created(_)));
    assert!(registry.contains("api"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn second_admission_is_rejected_without_creating() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let mut registry = SessionRegistry::new();
    registry
        .try_create("api", SessionTag::Configured, |_| Ok(terminal(&disposed)))
        .expect("create");

    let mut called = false;
    let admission = registry
        .try_create("api", SessionTag::Configured, |_| {
            called = true;
            Ok(terminal(&disposed))
        })
        .expect("no error");

    assert_eq!(admission, Admission::AlreadyExists);
    assert!(!called, "factory must not run for a taken name");
    assert_eq!(registry.len(), 1);
}

#[test]
fn failed_factory_leaves_registry_unchanged() {
    let mut registry = SessionRegistry::new();
    let err = registry
        .try_create("api", SessionTag::Configured, |_| {
            Err(AppError::Terminal("boom".into()))
        })
        .expect_err("factory error propagates");
    assert!(matches!(err, AppError::Terminal(_)));
    assert!(registry.is_empty());
}

#[test]
fn remove_disposes_once_and_is_idempotent() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let mut registry = SessionRegistry::new();
    registry
        .try_create("api", SessionTag::Configured, |_| Ok(terminal(&disposed)))
        .expect("create");

    assert!(registry.remove("api"));
    assert!(!registry.remove("api"));
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
}

#[test]
fn replace_disposes_previous_holder() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let mut registry = SessionRegistry::new();
    let old_id = match registry
        .try_create("[Module] svc", SessionTag::Configured, |_| Ok(terminal(&first)))
        .expect("create")
    {
        Admission::Created(id) => id,
        Admission::AlreadyExists => panic!("name was free"),
    };

    let new_id = registry
        .replace("[Module] svc", SessionTag::Configured, |_| Ok(terminal(&second)))
        .expect("replace");

    assert_ne!(old_id, new_id);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
    assert_eq!(registry.get("[Module] svc").expect("entry").id(), new_id);
}

#[test]
fn release_closed_ignores_stale_instance() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let mut registry = SessionRegistry::new();
    let Admission::Created(old_id) = registry
        .try_create("api", SessionTag::Configured, |_| Ok(terminal(&disposed)))
        .expect("create")
    else {
        panic!("name was free");
    };
    registry.remove("api");
    registry
        .try_create("api", SessionTag::Configured, |_| Ok(terminal(&disposed)))
        .expect("recreate");

    assert!(!registry.release_closed("api", old_id));
    assert!(registry.contains("api"));

    let live = registry.get("api").expect("entry").id();
    assert!(registry.release_closed("api", live));
    assert!(!registry.contains("api"));
}

#[test]
fn remove_all_disposes_everything() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let mut registry = SessionRegistry::new();
    for name in ["a", "b", "c"] {
        registry
            .try_create(name, SessionTag::Configured, |_| Ok(terminal(&disposed)))
            .expect("create");
    }
    assert_eq!(registry.remove_all(), 3);
    assert!(registry.is_empty());
    assert_eq!(disposed.load(Ordering::SeqCst), 3);
}

#[test]
fn names_where_filters_by_tag() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let mut registry = SessionRegistry::new();
    registry
        .try_create("api", SessionTag::Configured, |_| Ok(terminal(&disposed)))
        .expect("create");
    registry
        .try_create(
            "svc - build",
            SessionTag::ModuleScript {
                module: "svc".into(),
                script: "build".into(),
            },
            |_| Ok(terminal(&disposed)),
        )
        .expect("create");

    assert_eq!(registry.names(), vec!["api", "svc - build"]);
    assert_eq!(
        registry.names_where(|tag| tag.module().is_some()),
        vec!["svc - build"]
    );
    let summaries = registry.summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].name, "api");
    assert_eq!(summaries[0].tag, SessionTag::Configured);
}
