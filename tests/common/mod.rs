//! Shared test utilities for the integration suites
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::Once;

pub use annostore::{
    Annotation, AnnotationBin, AnnotationService, AnnotationStore, BinningScheme, FilterConfig, MemoryBackend,
};
use serde_json::{json, Value};

static INIT_TRACING: Once = Once::new();

/// Route tracing output through the test harness
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Store over an in-memory backend with widths `{1: 5, 2: 10}`
pub fn example_store() -> AnnotationStore<u64, MemoryBackend<u64>> {
    init_tracing();
    let binning = BinningScheme::widths([(1, 5), (2, 10)]).expect("valid widths");
    AnnotationStore::new(MemoryBackend::new(binning).expect("valid backend"))
}

/// Store over an in-memory pyramid backend
pub fn pyramid_store(max_level: u32) -> AnnotationStore<u64, MemoryBackend<u64>> {
    init_tracing();
    let binning = BinningScheme::pyramid(max_level).expect("valid pyramid");
    AnnotationStore::new(MemoryBackend::new(binning).expect("valid backend"))
}

/// Annotation with an empty payload
pub fn note(coordinate: u64, group: &str, timestamp: u64) -> Annotation<u64> {
    Annotation::new(coordinate, group, json!({}), timestamp)
}

/// Annotation with the given payload
pub fn note_with(coordinate: u64, group: &str, timestamp: u64, payload: Value) -> Annotation<u64> {
    Annotation::new(coordinate, group, payload, timestamp)
}

/// Script filter node
pub fn script(source: &str) -> FilterConfig {
    FilterConfig::new("script").with_property("script", source)
}

/// `(key, member count)` per bin
pub fn shape<T: annostore::Coordinate>(bins: &[AnnotationBin<T>]) -> Vec<(u64, usize)> {
    bins.iter().map(|b| (b.key(), b.len())).collect()
}

/// Every member across all bins, in order
pub fn members<T: annostore::Coordinate>(bins: &[AnnotationBin<T>]) -> Vec<Annotation<T>> {
    bins.iter().flat_map(|b| b.members().iter().cloned()).collect()
}
