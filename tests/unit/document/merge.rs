use super::*;
use serde_json::json;

fn sample() -> Value {
    json!({
        "title": "Quarterly review",
        "theme": "default",
        "frontPage": { "title": "Q3", "author": "Ops", "date": null },
        "slides": [
            { "id": 1, "title": "a", "blocks": [] },
            { "id": 2, "title": "b", "blocks": [] }
        ]
    })
}

#[test]
fn empty_override_is_identity() {
    let merged = merge_override(sample(), Some(json!({}))).unwrap();
    assert_eq!(merged, sample());
}

#[test]
fn absent_override_is_noop() {
    let merged = merge_override(sample(), None).unwrap();
    assert_eq!(merged, sample());
}

#[test]
fn arrays_are_replaced_wholesale() {
    let merged = merge_override(
        sample(),
        Some(json!({ "slides": [{ "id": 9, "title": "c" }] })),
    )
    .unwrap();
    assert_eq!(merged["slides"], json!([{ "id": 9, "title": "c" }]));
}

#[test]
fn nested_objects_merge_key_by_key() {
    let merged = merge_override(
        sample(),
        Some(json!({ "theme": "gov-blue", "frontPage": { "author": "Finance" } })),
    )
    .unwrap();
    assert_eq!(merged["theme"], "gov-blue");
    assert_eq!(merged["frontPage"]["title"], "Q3");
    assert_eq!(merged["frontPage"]["author"], "Finance");
    assert_eq!(merged["frontPage"]["date"], Value::Null);
    assert_eq!(merged["title"], "Quarterly review");
}

#[test]
fn override_adds_missing_keys_and_null_replaces() {
    let merged = merge_override(
        sample(),
        Some(json!({ "logo": "logo.png", "frontPage": null })),
    )
    .unwrap();
    assert_eq!(merged["logo"], "logo.png");
    assert_eq!(merged["frontPage"], Value::Null);
}

#[test]
fn scalar_base_is_replaced_by_object_override() {
    let mut target = json!({ "theme": "default" });
    deep_merge(&mut target, json!({ "theme": { "name": "x" } }));
    assert_eq!(target["theme"]["name"], "x");
}

#[test]
fn non_object_override_is_a_merge_error() {
    let err = merge_override(sample(), Some(json!([1, 2]))).unwrap_err();
    assert!(matches!(err, SlidecastError::Merge(_)));
    assert!(err.to_string().contains("must be a JSON object, got array"));
}

#[test]
fn malformed_override_text_is_a_merge_error() {
    let err = parse_override("{ \"theme\": ").unwrap_err();
    assert!(matches!(err, SlidecastError::Merge(_)));
}
