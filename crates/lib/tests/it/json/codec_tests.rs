use std::cmp::Ordering;

use arbor::json::{self, JsonError, JsonFormat};
use arbor::{Error, Node, NodeKind, Value, ops, path};

use crate::helpers::sample_tree;

const SAMPLE: &str = r#"{"db":{"host":"localhost","port":5432},"debug":false,"hosts":["a","b","c"]}"#;

#[test]
fn imported_document_matches_built_tree() {
    let imported = json::from_json(SAMPLE, 0, Some("cfg")).unwrap();
    assert_eq!(ops::compare_strict(&imported.view(), &sample_tree().view()), Ordering::Equal);
    assert_eq!(json::to_json(&sample_tree().view(), JsonFormat::Compact).unwrap(), SAMPLE);
}

#[test]
fn explicit_uid_is_kept() {
    let root = json::from_json("[]", 987_654_321, None).unwrap();
    assert_eq!(root.uid(), 987_654_321);
    assert_eq!(root.kind(), NodeKind::Array);
    assert!(root.name().is_none());
}

#[test]
fn imported_children_know_their_parents() {
    let root = json::from_json(SAMPLE, 0, None).unwrap();
    let db = ops::node_get(&root, &path!["db"], None, false).unwrap();
    assert!(db.is_name("db"));
    assert_eq!(ops::path_of(&db).unwrap(), path!["db"]);
    assert!(ops::parents_check(&root, false).is_empty());
}

#[test]
fn export_of_a_subtree() {
    let root = sample_tree();
    let db = ops::node_view_get(&root.view(), &path!["db"]).unwrap();
    assert_eq!(
        json::to_json(&db, JsonFormat::Compact).unwrap(),
        r#"{"host":"localhost","port":5432}"#
    );
}

#[test]
fn tombstones_are_not_exported() {
    let root = sample_tree();
    root.erase("debug");
    let text = json::to_json(&root.view(), JsonFormat::Compact).unwrap();
    assert!(!text.contains("debug"));
}

#[test]
fn scalar_conversions() {
    assert_eq!(json::value_to_json(&Value::from("x")).unwrap(), serde_json::json!("x"));
    assert_eq!(json::value_to_json(&Value::Empty).unwrap(), serde_json::Value::Null);
    assert!(json::value_to_json(&Value::Double(f64::NAN)).is_err());

    let value = json::value_from_json(&serde_json::json!({"k": [1, 2]})).unwrap();
    let node = value.as_node().unwrap();
    assert!(ops::at(node, &path!["k", 1usize]) == 2i64);
    assert_eq!(json::value_from_json(&serde_json::json!(2.5)).unwrap(), Value::Double(2.5));
}

#[test]
fn errors_are_classified() {
    let err = json::from_json("not json", 0, None).unwrap_err();
    assert!(err.is_parse_error());
    assert!(matches!(err, Error::Json(JsonError::Parse { .. })));

    let err = json::from_json(r#""text""#, 0, None).unwrap_err();
    assert!(matches!(err, Error::Json(JsonError::NotAContainer { ref found }) if found == "string"));

    let root = Node::new(NodeKind::Map);
    root.set("bad", f64::NEG_INFINITY);
    let err = json::to_json(&root.view(), JsonFormat::Pretty).unwrap_err();
    assert_eq!(err.module(), "json");
}
