//! Integration tests for value trees and the model store.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use valuable_store::{
    Definition, FieldType, List, LiteralType, Raw, Schema, SequentialIds, Snapshot, Store,
    StoreConfig, Struct, Valuable, Value,
};

fn todo_definition() -> Definition {
    Definition::new()
        .model(
            "Todo",
            Schema::new()
                .field("title", LiteralType::Str)
                .field("done", LiteralType::Bool)
                .field("tags", FieldType::list_of(LiteralType::Str)),
        )
        .model("Item", Schema::new().field("name", LiteralType::Str))
}

fn test_store() -> Store {
    Store::new(
        todo_definition(),
        StoreConfig::default().with_id_generator(SequentialIds::new("id")),
    )
    .unwrap()
}

fn record<V: Valuable>(node: &V) -> Arc<Mutex<Vec<Raw>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    node.observe(move |raw| sink.lock().push(raw.clone())).unwrap();
    seen
}

// --- Value Tree Workflows ---

#[test]
fn test_nested_list_single_notification() {
    let list = List::from_raw(vec![json!(0), json!([1, true])]);
    let seen = record(&list);

    let inner = list.get(1).unwrap().into_list().unwrap();
    inner.get(1).unwrap().set_val(false).unwrap();

    assert_eq!(*seen.lock(), vec![json!([0, [1, false]])]);
    assert_eq!(list.val().unwrap(), json!([0, [1, false]]));
}

#[test]
fn test_every_ancestor_notified_once() {
    let todo = Struct::new(
        Schema::new().field("tags", FieldType::list_of(LiteralType::Str)),
        json!({"tags": ["a"]}),
    )
    .unwrap();
    let tags = todo.get("tags").unwrap().into_list().unwrap();
    let leaf = tags.get(0).unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    for (name, node) in [
        ("tags", todo.get("tags").unwrap()),
        ("leaf", leaf.clone()),
    ] {
        let sink = Arc::clone(&order);
        node.observe(move |_| sink.lock().push(name)).unwrap();
    }
    let sink = Arc::clone(&order);
    todo.observe(move |_| sink.lock().push("root")).unwrap();

    leaf.set_val("b").unwrap();

    assert_eq!(*order.lock(), vec!["root", "tags", "leaf"]);
    assert_eq!(todo.val().unwrap(), json!({"tags": ["b"]}));
}

#[test]
fn test_observer_sees_consistent_tree() {
    let list = List::from_raw(vec![json!(1), json!(2)]);
    let reader = list.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    list.observe(move |raw| {
        sink.lock().push((raw.clone(), reader.val().unwrap()));
    })
    .unwrap();

    list.push(3).unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, seen[0].1);
}

#[test]
fn test_attaching_copies_value() {
    let source = Value::new("x");
    let list = List::new();
    list.push_node(&source).unwrap();

    source.set_val("y").unwrap();

    assert_eq!(list.val().unwrap(), json!(["x"]));
}

// --- Store Workflows ---

#[test]
fn test_commit_get_destroy() {
    let store = test_store();
    let mut item = store.create("Item", json!({"name": "a"})).unwrap();

    store.commit([&mut item]).unwrap();
    let id = item.id().cloned().unwrap();
    assert_eq!(store.get("Item", &id).unwrap()["name"], json!("a"));

    item.mark_destroy();
    store.commit([&mut item]).unwrap();
    assert!(store.get("Item", &id).is_none());
}

#[test]
fn test_commit_is_one_version_for_many_models() {
    let store = test_store();
    let snapshots: Arc<Mutex<Vec<Snapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);
    store.observe(move |snapshot| sink.lock().push(snapshot.clone()));

    let mut todos = store
        .collection(
            "Todo",
            vec![
                json!({"title": "one"}),
                json!({"title": "two"}),
                json!({"title": "three"}),
            ],
        )
        .unwrap();
    store.commit(&mut todos).unwrap();

    let snapshots = snapshots.lock();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].len("Todo"), 3);
    assert_eq!(snapshots[0].version(), 1);
}

#[test]
fn test_model_edits_invisible_until_commit() {
    let store = test_store();
    let mut todo = store.create("Todo", json!({"title": "draft"})).unwrap();
    store.commit([&mut todo]).unwrap();
    let id = todo.id().cloned().unwrap();

    let tags = todo.get("tags").unwrap().into_list().unwrap();
    tags.push("urgent").unwrap();
    todo.set("done", true).unwrap();

    assert_eq!(
        store.get("Todo", &id),
        Some(json!({"title": "draft", "done": false, "tags": []}))
    );

    store.commit([&mut todo]).unwrap();
    assert_eq!(
        store.get("Todo", &id),
        Some(json!({"title": "draft", "done": true, "tags": ["urgent"]}))
    );
}

#[test]
fn test_typed_models() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Todo {
        title: String,
        done: bool,
        tags: Vec<String>,
    }

    let store = test_store();
    let todo = Todo {
        title: "typed".to_string(),
        done: true,
        tags: vec!["a".to_string()],
    };
    let mut model = store.create_from("Todo", &todo).unwrap();
    store.commit([&mut model]).unwrap();

    assert_eq!(model.to_typed::<Todo>().unwrap(), todo);
}

#[test]
fn test_ids_are_unique_across_commits() {
    let store = Store::with_definition(todo_definition()).unwrap();
    let mut a = store.create("Item", json!(null)).unwrap();
    let mut b = store.create("Item", json!(null)).unwrap();

    store.commit([&mut a]).unwrap();
    store.commit([&mut b]).unwrap();

    assert_ne!(a.id(), b.id());
    assert_eq!(store.snapshot().len("Item"), 2);
}

#[test]
fn test_store_observer_reentrant_read() {
    let store = Arc::new(test_store());
    let reader = Arc::clone(&store);
    let versions = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&versions);
    store.observe(move |_| sink.lock().push(reader.version()));

    let mut item = store.create("Item", json!(null)).unwrap();
    store.commit([&mut item]).unwrap();
    store.commit([&mut item]).unwrap();

    assert_eq!(*versions.lock(), vec![1, 2]);
}

#[test]
fn test_models_listed_in_declaration_order() {
    let store = test_store();
    assert_eq!(store.models(), vec!["Todo".to_string(), "Item".to_string()]);
}

#[test]
fn test_tracing_subscriber_captures_commit() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let store = test_store();
    let mut item = store.create("Item", json!({"name": "logged"})).unwrap();
    assert!(store.commit([&mut item]).is_ok());
}
