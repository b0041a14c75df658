use super::*;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "slidecast_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const DECK: &str = r#"{
    "title": "Deck",
    "theme": "default",
    "slides": [
        { "id": 1, "title": "First", "blocks": [{ "type": "text", "text": "hi" }] },
        { "id": 2, "title": "Second" }
    ]
}"#;

#[test]
fn loads_without_override() {
    let dir = temp_dir("load_plain");
    let input = dir.join("deck.json");
    std::fs::write(&input, DECK).unwrap();

    let v = load_presentation(&input, None).unwrap();
    assert_eq!(v.presentation.slides.len(), 2);
    assert_eq!(v.presentation.theme.as_deref(), Some("default"));
}

#[test]
fn sibling_override_is_merged_before_validation() {
    let dir = temp_dir("load_sibling");
    let input = dir.join("deck.json");
    std::fs::write(&input, DECK).unwrap();
    std::fs::write(
        dir.join(OVERRIDE_FILE_NAME),
        r#"{ "theme": "gov-blue", "slides": [{ "id": 1, "title": "Only" }] }"#,
    )
    .unwrap();

    let p = load_presentation(&input, None).unwrap().presentation;
    assert_eq!(p.theme.as_deref(), Some("gov-blue"));
    assert_eq!(p.slides.len(), 1);
    assert_eq!(p.slides[0].title.as_deref(), Some("Only"));
    assert_eq!(p.title.as_deref(), Some("Deck"));
}

#[test]
fn merged_result_is_what_gets_validated() {
    let dir = temp_dir("load_invalid_merge");
    let input = dir.join("deck.json");
    std::fs::write(&input, DECK).unwrap();
    let over = dir.join("patch.json");
    std::fs::write(&over, r#"{ "slides": [] }"#).unwrap();

    let err = load_presentation(&input, Some(&over)).unwrap_err();
    assert!(matches!(err, SlidecastError::Schema(_)));
}

#[test]
fn malformed_override_fails_before_validation() {
    let dir = temp_dir("load_bad_override");
    let input = dir.join("deck.json");
    std::fs::write(&input, DECK).unwrap();
    std::fs::write(dir.join(OVERRIDE_FILE_NAME), "{ not json").unwrap();

    let err = load_presentation(&input, None).unwrap_err();
    assert!(matches!(err, SlidecastError::Merge(_)));
    assert!(err.to_string().contains(OVERRIDE_FILE_NAME));
}

#[test]
fn missing_input_reports_path() {
    let dir = temp_dir("load_missing");
    let input = dir.join("nope.json");
    let err = load_presentation(&input, None).unwrap_err();
    assert!(matches!(err, SlidecastError::Io { .. }));
    assert!(err.to_string().contains("nope.json"));
}

#[test]
fn input_named_override_json_is_not_merged_with_itself() {
    let dir = temp_dir("load_self");
    let input = dir.join(OVERRIDE_FILE_NAME);
    std::fs::write(&input, DECK).unwrap();
    assert_eq!(sibling_override(&input), None);
}
