//! Scripts, recency, composites and registry configuration through the store

use crate::common::*;
use annostore::filters::ScriptableFilter;
use annostore::{
    AnnotationFilter, Coordinate, FilterBuildError, FilterChain, FilterFactory, FilterRegistry, PropertyKind,
    PropertySpec,
};
use proptest::prelude::*;
use serde_json::json;

fn timestamps(bins: &[AnnotationBin<u64>]) -> Vec<u64> {
    members(bins).iter().map(|a| a.timestamp()).collect()
}

#[test]
fn test_recency_bound() {
    let store = example_store();
    store
        .write_annotations(vec![note(10, "g", 5), note(11, "g", 4), note(12, "g", 3)])
        .unwrap();
    store.reconfigure(&[FilterConfig::new("most_recent_by_group").with_property("count", 2)]);

    let bins = store.read_annotations(&10, &14, 1).unwrap();
    assert_eq!(timestamps(&bins), vec![5, 4]);
}

#[test]
fn test_recency_spans_bins_of_one_read() {
    let store = example_store();
    // Newest annotation of the group sits in the later bin
    store
        .write_annotations(vec![note(10, "g", 1), note(11, "g", 2), note(16, "g", 9)])
        .unwrap();
    store.reconfigure(&[FilterConfig::new("most_recent_by_group").with_property("count", 2)]);

    let bins = store.read_annotations(&10, &19, 1).unwrap();
    assert_eq!(shape(&bins), vec![(2, 1), (3, 1)]);
    assert_eq!(timestamps(&bins), vec![2, 9]);
}

#[test]
fn test_script_on_payload() {
    let store = example_store();
    store
        .write_annotations(vec![
            note_with(10, "a", 1, json!({"score": 0.9, "tags": ["keep"]})),
            note_with(11, "a", 2, json!({"score": 0.2, "tags": ["keep"]})),
            note_with(12, "a", 3, json!({"score": 0.8, "tags": []})),
        ])
        .unwrap();
    store.reconfigure(&[script("annotation.payload.score > 0.5 && contains(annotation.payload.tags, 'keep')")]);

    let bins = store.read_annotations(&10, &14, 1).unwrap();
    assert_eq!(timestamps(&bins), vec![1]);
}

#[test]
fn test_script_errors_fail_closed() {
    let store = example_store();
    store
        .write_annotations(vec![
            note_with(10, "a", 1, json!({"score": 3})),
            note_with(11, "a", 2, json!({"score": "high"})),
            note_with(12, "a", 3, json!({})),
        ])
        .unwrap();
    store.reconfigure(&[script("annotation.payload.score > 1")]);

    // string > number and null > number are evaluation errors: rejected, read continues
    let bins = store.read_annotations(&10, &14, 1).unwrap();
    assert_eq!(timestamps(&bins), vec![1]);
}

#[test]
fn test_non_boolean_script_rejects() {
    let store = example_store();
    store.write_annotation(note(10, "a", 1)).unwrap();
    store.reconfigure(&[script("annotation.group")]);
    assert!(store.read_annotations(&10, &14, 1).unwrap().is_empty());
}

#[test]
fn test_chain_is_conjunction() {
    let store = example_store();
    store
        .write_annotations(vec![note(10, "a", 1), note(11, "b", 2), note(12, "a", 3)])
        .unwrap();
    store.reconfigure(&[script("annotation.group == 'a'"), script("annotation.timestamp > 1")]);
    assert_eq!(timestamps(&store.read_annotations(&10, &14, 1).unwrap()), vec![3]);

    // Removing a filter only enlarges the result
    store.reconfigure(&[script("annotation.group == 'a'")]);
    assert_eq!(timestamps(&store.read_annotations(&10, &14, 1).unwrap()), vec![1, 3]);
}

#[test]
fn test_composites_from_config() {
    let store = example_store();
    store
        .write_annotations(vec![note(10, "a", 1), note(11, "b", 2), note(12, "c", 3)])
        .unwrap();
    let diagnostics = store.reconfigure(&[FilterConfig::new("not").with_child(
        FilterConfig::new("any")
            .with_child(script("annotation.group == 'a'"))
            .with_child(script("annotation.group == 'c'")),
    )]);
    assert!(diagnostics.is_empty());
    assert_eq!(timestamps(&store.read_annotations(&10, &14, 1).unwrap()), vec![2]);
}

#[test]
fn test_bad_nodes_dropped_rest_applied() {
    let store = example_store();
    store.write_annotations(vec![note(10, "a", 1), note(11, "b", 2)]).unwrap();
    let diagnostics = store.reconfigure(&[
        FilterConfig::new("geo_fence"),
        script("annotation.group == 'a'"),
        FilterConfig::new("script"),
        FilterConfig::new("most_recent_by_group").with_property("count", -1),
    ]);

    let paths: Vec<&str> = diagnostics.iter().map(FilterBuildError::path).collect();
    assert_eq!(paths, vec!["filters[0]", "filters[2]", "filters[3]"]);
    assert!(matches!(diagnostics[0], FilterBuildError::UnknownFilterType { .. }));
    assert!(matches!(diagnostics[1], FilterBuildError::MissingProperty { .. }));
    assert!(matches!(diagnostics[2], FilterBuildError::InvalidProperty { .. }));

    assert_eq!(timestamps(&store.read_annotations(&10, &14, 1).unwrap()), vec![1]);
}

/// Keeps annotations whose coordinate is a multiple of `modulus`
#[derive(Debug, Clone)]
struct EveryNth {
    modulus: u64,
}

impl AnnotationFilter<u64> for EveryNth {
    fn name(&self) -> &str {
        "every_nth"
    }

    fn accepts(&mut self, annotation: &annostore::Annotation<u64>) -> bool {
        annotation.coordinate().ordinal() % self.modulus == 0
    }

    fn fresh(&self) -> Box<dyn AnnotationFilter<u64>> {
        Box::new(self.clone())
    }
}

#[test]
fn test_custom_filter_type() {
    init_tracing();
    let mut registry = FilterRegistry::<u64>::with_builtins();
    registry.register(
        "every_nth",
        FilterFactory::leaf(
            vec![PropertySpec::optional("modulus", "Keep multiples of this", PropertyKind::Integer, 2)],
            |props| {
                let modulus = props.get_u64("modulus").unwrap_or(2);
                if modulus == 0 {
                    return Err("modulus must be positive".to_string());
                }
                Ok(Box::new(EveryNth { modulus }) as Box<dyn AnnotationFilter<u64>>)
            },
        ),
    );
    let backend = MemoryBackend::new(BinningScheme::pyramid(8).unwrap()).unwrap();
    let store = AnnotationStore::with_registry(backend, registry);
    store
        .write_annotations((0..10).map(|c| note(c, "g", c)).collect())
        .unwrap();

    assert!(store
        .reconfigure(&[FilterConfig::new("every_nth").with_property("modulus", 3)])
        .is_empty());
    assert_eq!(timestamps(&store.read_annotations(&0, &9, 8).unwrap()), vec![0, 3, 6, 9]);

    let diagnostics = store.reconfigure(&[FilterConfig::new("every_nth").with_property("modulus", 0)]);
    assert!(matches!(diagnostics[0], FilterBuildError::FilterConstruction { .. }));
    assert!(store.filter_chain().is_empty());
}

#[test]
fn test_prebuilt_chain() {
    let store = example_store();
    store.write_annotations(vec![note(10, "a", 1), note(11, "b", 2)]).unwrap();
    let filter: Box<dyn AnnotationFilter<u64>> =
        Box::new(ScriptableFilter::new("annotation.group != 'a'").unwrap());
    store.set_filter_chain(FilterChain::new(vec![filter]));
    assert_eq!(timestamps(&store.read_annotations(&10, &14, 1).unwrap()), vec![2]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_dropping_stateless_filter_enlarges_result(
        groups in proptest::collection::vec(0u8..4, 1..30),
        threshold in 0u64..30,
        group in 0u8..4,
    ) {
        let store = example_store();
        let notes: Vec<_> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| note(10 + (i as u64 % 5), &format!("g{}", g), i as u64))
            .collect();
        store.write_annotations(notes).unwrap();

        let by_group = script(&format!("annotation.group == 'g{}'", group));
        let by_time = script(&format!("annotation.timestamp >= {}", threshold));

        store.reconfigure(&[by_group.clone(), by_time.clone()]);
        let both = timestamps(&store.read_annotations(&10, &14, 1).unwrap());
        store.reconfigure(&[by_group]);
        let group_only = timestamps(&store.read_annotations(&10, &14, 1).unwrap());
        store.reconfigure(&[by_time]);
        let time_only = timestamps(&store.read_annotations(&10, &14, 1).unwrap());

        for t in &both {
            prop_assert!(group_only.contains(t));
            prop_assert!(time_only.contains(t));
        }
        for t in &group_only {
            if time_only.contains(t) {
                prop_assert!(both.contains(t));
            }
        }
    }
}
