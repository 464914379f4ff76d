//! Snapshot immutability, identity and restore tests.

use serde_json::json;
use valuable_store::{
    Definition, LiteralType, ModelId, Schema, SequentialIds, Snapshot, Store, StoreConfig,
};

fn test_store() -> Store {
    Store::new(
        Definition::new()
            .model("Item", Schema::new().field("name", LiteralType::Str))
            .model("Note", Schema::new().field("body", LiteralType::Str)),
        StoreConfig::default().with_id_generator(SequentialIds::new("id")),
    )
    .unwrap()
}

fn names(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .get_all("Item")
        .into_iter()
        .map(|(_, raw)| raw["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_snapshot_unaffected_by_later_commits() {
    let store = test_store();
    let mut item = store.create("Item", json!({"name": "a"})).unwrap();
    store.commit([&mut item]).unwrap();
    let id = item.id().cloned().unwrap();

    let taken = store.snapshot();

    item.set("name", "b").unwrap();
    store.commit([&mut item]).unwrap();
    let mut extra = store.create("Item", json!({"name": "c"})).unwrap();
    store.commit([&mut extra]).unwrap();
    item.mark_destroy();
    store.commit([&mut item]).unwrap();

    assert_eq!(taken.get("Item", &id), Some(json!({"name": "a"})));
    assert_eq!(names(&taken), vec!["a"]);
    assert_eq!(names(&store.snapshot()), vec!["c"]);
}

#[test]
fn test_snapshot_unaffected_by_uncommitted_edits() {
    let store = test_store();
    let mut item = store.create("Item", json!({"name": "a"})).unwrap();
    let committed = store.commit([&mut item]).unwrap();

    item.set("name", "edited").unwrap();

    assert_eq!(names(&committed), vec!["a"]);
    assert_eq!(names(&store.snapshot()), vec!["a"]);
}

#[test]
fn test_store_identity() {
    let store = test_store();
    assert!(Store::is(&store, &store));

    let first = store.snapshot();
    let again = store.snapshot();
    assert!(Store::is(&first, &again));

    let mut item = store.create("Item", json!(null)).unwrap();
    let after = store.commit([&mut item]).unwrap();

    assert!(!Store::is(&first, &after));
    assert!(Store::is(&after, &store));
}

#[test]
fn test_empty_commit_still_publishes() {
    let store = test_store();
    let before = store.snapshot();

    let after = store.commit(Vec::new()).unwrap();

    assert!(!Store::is(&before, &after));
    assert_eq!(after.version(), before.version() + 1);
    assert_eq!(after.to_raw(), before.to_raw());
}

#[test]
fn test_commit_touches_only_named_models() {
    let store = test_store();
    let mut note = store.create("Note", json!({"body": "keep"})).unwrap();
    store.commit([&mut note]).unwrap();
    let before = store.snapshot();

    let mut item = store.create("Item", json!({"name": "x"})).unwrap();
    store.commit([&mut item]).unwrap();

    assert_eq!(store.snapshot().get_all("Note"), before.get_all("Note"));
    assert_eq!(store.snapshot().len("Item"), 1);
    assert_eq!(before.len("Item"), 0);
}

#[test]
fn test_restore_round_trip() {
    let store = test_store();
    let empty = store.snapshot();

    let mut item = store.create("Item", json!({"name": "a"})).unwrap();
    let one = store.commit([&mut item]).unwrap();

    store.restore_snapshot(&empty).unwrap();
    assert_eq!(store.snapshot().len("Item"), 0);
    assert!(Store::is(&store, &empty));

    store.restore_snapshot(&one).unwrap();
    assert_eq!(names(&store.snapshot()), vec!["a"]);
    assert!(Store::is(&store, &one));
}

#[test]
fn test_restore_notifies_once() {
    let store = test_store();
    let empty = store.snapshot();
    let mut item = store.create("Item", json!(null)).unwrap();
    store.commit([&mut item]).unwrap();

    let count = std::sync::Arc::new(parking_lot::Mutex::new(0));
    let sink = std::sync::Arc::clone(&count);
    store.observe(move |snapshot| {
        assert_eq!(snapshot.len("Item"), 0);
        *sink.lock() += 1;
    });

    store.restore_snapshot(&empty).unwrap();
    assert_eq!(*count.lock(), 1);
}

#[test]
fn test_commit_after_restore_builds_on_restored_state() {
    let store = test_store();
    let mut a = store.create("Item", json!({"name": "a"})).unwrap();
    let with_a = store.commit([&mut a]).unwrap();

    let mut b = store.create("Item", json!({"name": "b"})).unwrap();
    store.commit([&mut b]).unwrap();

    store.restore_snapshot(&with_a).unwrap();
    let mut c = store.create("Item", json!({"name": "c"})).unwrap();
    store.commit([&mut c]).unwrap();

    assert_eq!(names(&store.snapshot()), vec!["a", "c"]);
    assert!(store.get("Item", &ModelId::from("id2")).is_none());
}

#[test]
fn test_versions_stay_unique_across_restore() {
    let store = test_store();
    let mut item = store.create("Item", json!({"name": "a"})).unwrap();
    let first = store.commit([&mut item]).unwrap();
    item.set("name", "b").unwrap();
    let second = store.commit([&mut item]).unwrap();

    store.restore_snapshot(&first).unwrap();
    assert_eq!(store.version(), first.version());

    item.set("name", "c").unwrap();
    let third = store.commit([&mut item]).unwrap();

    assert_eq!(third.version(), 3);
    assert_ne!(third.version(), second.version());
    assert_eq!(second.get("Item", item.id().unwrap()), Some(json!({"name": "b"})));
    assert_eq!(names(&third), vec!["c"]);
}

#[test]
fn test_snapshot_to_raw_shape() {
    let store = test_store();
    let mut item = store.create("Item", json!({"name": "a"})).unwrap();
    store.commit([&mut item]).unwrap();

    assert_eq!(
        store.snapshot().to_raw(),
        json!({"Item": {"id1": {"name": "a"}}, "Note": {}})
    );
}

#[test]
fn test_snapshot_readable_from_other_threads() {
    let store = test_store();
    let mut item = store.create("Item", json!({"name": "shared"})).unwrap();
    let snapshot = store.commit([&mut item]).unwrap();
    let id = item.id().cloned().unwrap();

    let handle = std::thread::spawn(move || snapshot.get("Item", &id));

    item.set("name", "changed").unwrap();
    store.commit([&mut item]).unwrap();

    assert_eq!(handle.join().unwrap(), Some(json!({"name": "shared"})));
}
