// tests/event_filter.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use notify::event::{
    AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind,
    RenameMode,
};
use notify::EventKind as RawKind;
use relaunch::engine::{Decision, EventCallback, EventFilter, EventHandle};
use relaunch::watch::{classify, Debouncer, EventKind, IgnoreEvaluator, IgnoreRuleSet, RawEvent};

const ROOT: &str = "/proj";

fn write_kind() -> RawKind {
    RawKind::Modify(ModifyKind::Data(DataChange::Content))
}

fn write_event(rel: &str) -> RawEvent {
    RawEvent::new(Path::new(ROOT).join(rel), write_kind())
}

fn go_only_filter(debounce: Duration) -> EventFilter {
    let rules = IgnoreRuleSet {
        watched_extensions: vec!["*.go".to_string()],
        ..IgnoreRuleSet::default()
    };
    EventFilter::new(ROOT, IgnoreEvaluator::new(rules), Debouncer::new(debounce))
}

#[test]
fn classification_table() {
    let cases = [
        (RawKind::Create(CreateKind::File), Some(EventKind::Create)),
        (RawKind::Create(CreateKind::Folder), Some(EventKind::Create)),
        (RawKind::Create(CreateKind::Any), Some(EventKind::CreateAny)),
        (write_kind(), Some(EventKind::Write)),
        (RawKind::Modify(ModifyKind::Any), Some(EventKind::Write)),
        (
            RawKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            Some(EventKind::Attributes),
        ),
        (
            RawKind::Modify(ModifyKind::Name(RenameMode::Both)),
            Some(EventKind::Rename),
        ),
        (
            RawKind::Modify(ModifyKind::Name(RenameMode::From)),
            Some(EventKind::Rename),
        ),
        (
            RawKind::Modify(ModifyKind::Name(RenameMode::To)),
            Some(EventKind::MovedTo),
        ),
        (
            RawKind::Access(AccessKind::Close(AccessMode::Write)),
            Some(EventKind::CloseWrite),
        ),
        (RawKind::Access(AccessKind::Read), Some(EventKind::Access)),
        (RawKind::Remove(RemoveKind::File), Some(EventKind::Remove)),
        (RawKind::Remove(RemoveKind::Folder), Some(EventKind::Remove)),
        (RawKind::Remove(RemoveKind::Other), Some(EventKind::RemoveAny)),
        (RawKind::Modify(ModifyKind::Other), None),
        (RawKind::Any, None),
        (RawKind::Other, None),
    ];

    for (raw, expected) in cases {
        assert_eq!(classify(&raw), expected, "raw kind {raw:?}");
    }
}

#[test]
fn file_changes_trigger_reloads_and_the_rest_is_inert() {
    for kind in [
        EventKind::Write,
        EventKind::CloseWrite,
        EventKind::Create,
        EventKind::Remove,
        EventKind::MovedTo,
    ] {
        assert!(kind.triggers_reload(), "{kind} should reload");
    }
    for kind in [
        EventKind::CreateAny,
        EventKind::RemoveAny,
        EventKind::Rename,
        EventKind::Attributes,
        EventKind::Access,
    ] {
        assert!(!kind.triggers_reload(), "{kind} should be inert");
    }
}

#[test]
fn allow_listed_write_reloads_and_other_files_are_ignored() {
    let mut filter = go_only_filter(Duration::ZERO);
    let now = Instant::now();

    assert_eq!(filter.evaluate(&write_event("main.go"), now), Decision::Reload);
    assert_eq!(filter.evaluate(&write_event("README.md"), now), Decision::Ignored);
}

#[test]
fn unknown_and_inert_events_never_reload() {
    let mut filter = go_only_filter(Duration::ZERO);
    let now = Instant::now();

    let unknown = RawEvent::new("/proj/main.go", RawKind::Other);
    assert_eq!(filter.evaluate(&unknown, now), Decision::Unknown);

    let moved_away = RawEvent::new(
        "/proj/main.go",
        RawKind::Modify(ModifyKind::Name(RenameMode::From)),
    );
    assert_eq!(filter.evaluate(&moved_away, now), Decision::Inert);

    let chmod = RawEvent::new(
        "/proj/main.go",
        RawKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
    );
    assert_eq!(filter.evaluate(&chmod, now), Decision::Inert);
}

#[test]
fn atomic_saves_creations_and_deletions_reload() {
    let mut filter = go_only_filter(Duration::ZERO);
    let now = Instant::now();

    for raw in [
        RawKind::Modify(ModifyKind::Name(RenameMode::To)),
        RawKind::Create(CreateKind::File),
        RawKind::Remove(RemoveKind::File),
    ] {
        let label = format!("{raw:?}");
        let event = RawEvent::new("/proj/main.go", raw);
        assert_eq!(filter.evaluate(&event, now), Decision::Reload, "raw kind {label}");
    }
}

#[test]
fn burst_inside_debounce_window_reloads_once() {
    let mut filter = go_only_filter(Duration::from_millis(200));
    let t0 = Instant::now();

    assert_eq!(filter.evaluate(&write_event("main.go"), t0), Decision::Reload);
    assert_eq!(
        filter.evaluate(&write_event("main.go"), t0 + Duration::from_millis(50)),
        Decision::Debounced
    );
    assert_eq!(
        filter.evaluate(&write_event("main.go"), t0 + Duration::from_millis(250)),
        Decision::Reload
    );
}

#[test]
fn ignored_events_do_not_consume_the_debounce_window() {
    let mut filter = go_only_filter(Duration::from_millis(200));
    let t0 = Instant::now();

    assert_eq!(filter.evaluate(&write_event("notes.txt"), t0), Decision::Ignored);
    assert_eq!(
        filter.evaluate(&write_event("main.go"), t0 + Duration::from_millis(10)),
        Decision::Reload
    );
}

#[test]
fn callback_sees_relative_path_and_kind() {
    let seen: Arc<Mutex<Vec<EventCallback>>> = Arc::default();
    let mut filter = go_only_filter(Duration::ZERO);
    {
        let seen = Arc::clone(&seen);
        filter.set_callback(Arc::new(move |event: &EventCallback| {
            seen.lock().unwrap().push(event.clone());
            EventHandle::Continue
        }));
    }

    filter.evaluate(&write_event("cmd/app/main.go"), Instant::now());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind, EventKind::Write);
    assert_eq!(seen[0].path, PathBuf::from("cmd/app/main.go"));
}

#[test]
fn callback_ignore_drops_even_reloadable_events() {
    let mut filter = go_only_filter(Duration::ZERO);
    filter.set_callback(Arc::new(|_: &EventCallback| EventHandle::Ignore));

    assert_eq!(
        filter.evaluate(&write_event("main.go"), Instant::now()),
        Decision::Dropped
    );
}

#[test]
fn callback_bypass_skips_ignore_and_debounce() {
    let mut filter = go_only_filter(Duration::from_secs(60));
    filter.set_callback(Arc::new(|event: &EventCallback| {
        if event.path.extension().is_some_and(|e| e == "md") {
            EventHandle::Bypass
        } else {
            EventHandle::Continue
        }
    }));
    let t0 = Instant::now();

    // Ignored by the allow-list, forced through by the callback.
    assert_eq!(filter.evaluate(&write_event("README.md"), t0), Decision::Bypass);
    // Bypass does not touch the debouncer, so this one is still accepted.
    assert_eq!(filter.evaluate(&write_event("main.go"), t0), Decision::Reload);
    assert_eq!(filter.evaluate(&write_event("README.md"), t0), Decision::Bypass);
    assert_eq!(filter.evaluate(&write_event("main.go"), t0), Decision::Debounced);
}

#[test]
fn bypass_applies_to_inert_kinds_too() {
    let mut filter = go_only_filter(Duration::ZERO);
    filter.set_callback(Arc::new(|event: &EventCallback| match event.kind {
        EventKind::Attributes => EventHandle::Bypass,
        _ => EventHandle::Continue,
    }));

    let chmod = RawEvent::new(
        "/proj/run.sh",
        RawKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
    );
    assert_eq!(filter.evaluate(&chmod, Instant::now()), Decision::Bypass);
}

#[test]
fn paths_outside_root_are_matched_as_absolute() {
    let mut filter = go_only_filter(Duration::ZERO);
    let outside = RawEvent::new("/elsewhere/README.md", write_kind());
    assert_eq!(filter.evaluate(&outside, Instant::now()), Decision::Ignored);
}
