//! Removal, configuration files and backend failures

use crate::common::*;
use annostore::{AnnotationError, StoreConfig};
use annostore_storage::testing::UnavailableBackend;
use tempfile::TempDir;

#[test]
fn test_duplicate_writes_are_separate_members() {
    let store = example_store();
    let a = note(10, "g", 1);
    store.write_annotation(a.clone()).unwrap();
    store.write_annotation(a.clone()).unwrap();
    assert_eq!(shape(&store.read_annotations(&10, &10, 1).unwrap()), vec![(2, 2)]);
}

#[test]
fn test_remove_then_remove_again() {
    let store = example_store();
    let a = note(10, "g", 1);
    let b = note(12, "g", 2);
    store.write_annotations(vec![a.clone(), b.clone()]).unwrap();

    store.remove_annotation(&a).unwrap();
    let after_first = store.read_annotations(&10, &14, 1).unwrap();
    store.remove_annotation(&a).unwrap();
    let after_second = store.read_annotations(&10, &14, 1).unwrap();

    assert_eq!(after_first, after_second);
    assert_eq!(members(&after_second), vec![b]);
}

#[test]
fn test_remove_matches_identity_not_payload() {
    let store = example_store();
    store
        .write_annotation(note_with(10, "g", 1, serde_json::json!({"v": 1})))
        .unwrap();
    store.remove_annotation(&note_with(10, "g", 1, serde_json::json!({"v": 2}))).unwrap();
    assert!(store.read_annotations(&10, &14, 1).unwrap().is_empty());
}

#[test]
fn test_remove_batch_and_missing() {
    let store = example_store();
    store
        .write_annotations(vec![note(10, "g", 1), note(11, "g", 2), note(12, "h", 3)])
        .unwrap();
    store
        .remove_annotations(&[note(10, "g", 1), note(12, "h", 3), note(99, "never", 0)])
        .unwrap();
    let remaining: Vec<u64> = members(&store.read_annotations(&10, &14, 1).unwrap())
        .iter()
        .map(|a| a.timestamp())
        .collect();
    assert_eq!(remaining, vec![2]);
}

#[test]
fn test_invalid_ranges() {
    let store = example_store();
    let err = store.read_annotations(&20, &10, 1).unwrap_err();
    assert!(matches!(err, AnnotationError::InvalidRange { .. }));
    assert!(store.read_annotations(&10, &20, 7).unwrap_err().is_invalid_range());
}

#[test]
fn test_backend_failure_propagates() {
    init_tracing();
    let store: AnnotationStore<u64, _> =
        AnnotationStore::new(UnavailableBackend::new(BinningScheme::default(), "connection refused"));
    assert_eq!(
        store.read_annotations(&0, &1, 0).unwrap_err(),
        AnnotationError::StorageUnavailable("connection refused".into())
    );
    assert!(matches!(
        store.write_annotations(vec![note(1, "g", 1)]),
        Err(AnnotationError::StorageUnavailable(_))
    ));
    // Argument checks still come first
    assert!(store.read_annotations(&5, &1, 0).unwrap_err().is_invalid_range());
}

#[test]
fn test_store_from_config_file() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annostore.toml");
    std::fs::write(
        &path,
        r#"
[binning]
scheme = "widths"
widths = { "1" = 5, "2" = 10 }

[[filters]]
type = "script"
properties = { script = "annotation.payload.visible != false" }

[[filters]]
type = "most_recent_by_group"

[[filters]]
type = "no_such_filter"

[defaults.most_recent_by_group]
count = 2
"#,
    )
    .unwrap();

    let config = StoreConfig::from_file(&path).unwrap();
    let (store, diagnostics) = AnnotationStore::<u64, MemoryBackend<u64>>::from_config(&config).unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].path(), "filters[2]");
    assert_eq!(store.filter_chain().names(), vec!["script", "most_recent_by_group"]);

    store
        .write_annotations(vec![
            note_with(10, "g", 1, serde_json::json!({})),
            note_with(11, "g", 2, serde_json::json!({"visible": false})),
            note_with(12, "g", 3, serde_json::json!({})),
            note_with(13, "g", 4, serde_json::json!({})),
        ])
        .unwrap();
    let kept: Vec<u64> = members(&store.read_annotations(&10, &15, 2).unwrap())
        .iter()
        .map(|a| a.timestamp())
        .collect();
    assert_eq!(kept, vec![3, 4]);
}

#[test]
fn test_json_config_file() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("annostore.json");
    std::fs::write(
        &path,
        r#"{"binning": {"scheme": "pyramid", "max_level": 4}, "filters": [{"type": "all"}]}"#,
    )
    .unwrap();
    let config = StoreConfig::from_file(&path).unwrap();
    let (store, diagnostics) = AnnotationStore::<u64, MemoryBackend<u64>>::from_config(&config).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(store.binning(), &BinningScheme::pyramid(4).unwrap());
}
