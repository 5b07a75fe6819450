//! Level reads and nesting across levels

use crate::common::*;
use annostore::{AnnotationStore, BinningScheme, Coordinate, MemoryBackend};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashMap;

#[test]
fn test_worked_example_levels() {
    let store = example_store();
    store
        .write_annotations(vec![note(10, "a", 1), note(12, "a", 2), note(15, "a", 3)])
        .unwrap();

    assert_eq!(shape(&store.read_annotations(&10, &15, 2).unwrap()), vec![(1, 3)]);
    assert_eq!(shape(&store.read_annotations(&10, &15, 1).unwrap()), vec![(2, 2), (3, 1)]);
}

#[test]
fn test_read_returns_whole_intersecting_bins() {
    let store = example_store();
    store
        .write_annotations(vec![note(10, "a", 1), note(12, "a", 2), note(15, "a", 3)])
        .unwrap();

    // [12, 12] touches only bucket 2 at level 1, which also holds coordinate 10
    let bins = store.read_annotations(&12, &12, 1).unwrap();
    assert_eq!(shape(&bins), vec![(2, 2)]);
    let coordinates: Vec<u64> = members(&bins).iter().map(|a| *a.coordinate()).collect();
    assert_eq!(coordinates, vec![10, 12]);
}

#[test]
fn test_read_outside_written_range_is_empty() {
    let store = example_store();
    store.write_annotation(note(10, "a", 1)).unwrap();
    assert!(store.read_annotations(&100, &200, 1).unwrap().is_empty());
}

#[test]
fn test_write_visible_at_every_level() {
    let store = pyramid_store(6);
    store.write_annotation(note(37, "a", 1)).unwrap();
    for level in 0..=6 {
        let bins = store.read_annotations(&0, &63, level).unwrap();
        assert_eq!(members(&bins).len(), 1, "level {}", level);
        assert_eq!(bins[0].key(), 37 >> (6 - level));
    }
}

#[test]
fn test_datetime_coordinates() {
    init_tracing();
    let backend = MemoryBackend::<DateTime<Utc>>::new(BinningScheme::widths([(0, 3_600_000), (1, 60_000)]).unwrap())
        .unwrap();
    let store = AnnotationStore::new(backend);
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    store
        .write_annotations(vec![
            annostore::Annotation::new(base, "cam", serde_json::json!({}), 1),
            annostore::Annotation::new(base + Duration::seconds(30), "cam", serde_json::json!({}), 2),
            annostore::Annotation::new(base + Duration::minutes(5), "cam", serde_json::json!({}), 3),
        ])
        .unwrap();

    let hourly = store.read_annotations(&base, &(base + Duration::minutes(10)), 0).unwrap();
    assert_eq!(hourly.len(), 1);
    assert_eq!(hourly[0].len(), 3);

    let minutely = store.read_annotations(&base, &(base + Duration::minutes(10)), 1).unwrap();
    let sizes: Vec<usize> = minutely.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![2, 1]);
    assert_eq!(minutely[0].key(), base.ordinal() / 60_000);
}

#[test]
fn test_negative_coordinates() {
    init_tracing();
    let store = AnnotationStore::new(MemoryBackend::<i64>::new(BinningScheme::pyramid(63).unwrap()).unwrap());
    store
        .write_annotations(vec![
            annostore::Annotation::new(-5i64, "g", serde_json::json!({}), 1),
            annostore::Annotation::new(3i64, "g", serde_json::json!({}), 2),
        ])
        .unwrap();
    let bins = store.read_annotations(&-10, &10, 63).unwrap();
    let coordinates: Vec<i64> = members(&bins).iter().map(|a| *a.coordinate()).collect();
    assert_eq!(coordinates, vec![-5, 3]);
}

fn bin_of_each(bins: &[annostore::AnnotationBin<u64>]) -> HashMap<u64, u64> {
    // timestamps are unique per annotation in these tests
    bins.iter()
        .flat_map(|b| b.members().iter().map(move |a| (a.timestamp(), b.key())))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_coarser_levels_aggregate_finer(coordinates in proptest::collection::vec(0u64..4096, 1..40)) {
        let store = pyramid_store(12);
        let notes: Vec<_> = coordinates.iter().enumerate().map(|(i, c)| note(*c, "g", i as u64)).collect();
        store.write_annotations(notes).unwrap();

        for fine in 1..=12u32 {
            let coarse = fine - 1;
            let fine_bins = store.read_annotations(&0, &4095, fine).unwrap();
            let coarse_bins = store.read_annotations(&0, &4095, coarse).unwrap();
            prop_assert_eq!(members(&fine_bins).len(), members(&coarse_bins).len());

            let fine_of = bin_of_each(&fine_bins);
            let coarse_of = bin_of_each(&coarse_bins);
            for (a, fa) in &fine_of {
                for (b, fb) in &fine_of {
                    if fa == fb {
                        prop_assert_eq!(coarse_of[a], coarse_of[b]);
                    }
                }
            }
        }
    }
}
