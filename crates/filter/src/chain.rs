//! Ordered filter chains
//!
//! A `FilterChain` is the configured, shared form: built once from
//! configuration and never mutated. Each read calls `instantiate` to get a
//! `ScanChain` holding fresh per-scan filter state, so concurrent reads never
//! share counters.

use std::fmt;

use annostore_core::{Annotation, AnnotationFilter, Coordinate};

/// Configured conjunction of filters, in evaluation order
pub struct FilterChain<T: Coordinate> {
    filters: Vec<Box<dyn AnnotationFilter<T>>>,
}

impl<T: Coordinate> FilterChain<T> {
    /// Chain evaluating `filters` in order
    pub fn new(filters: Vec<Box<dyn AnnotationFilter<T>>>) -> Self {
        Self { filters }
    }

    /// Chain that accepts everything
    pub fn empty() -> Self {
        Self { filters: Vec::new() }
    }

    /// Number of filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True if the chain has no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filter type names in evaluation order
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Per-scan copy with fresh filter state
    pub fn instantiate(&self) -> ScanChain<T> {
        ScanChain {
            filters: self.filters.iter().map(|f| f.fresh()).collect(),
        }
    }
}

impl<T: Coordinate> Default for FilterChain<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Coordinate> fmt::Debug for FilterChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}

/// Scan-local chain instance
///
/// Dropped at the end of the read together with any filter state.
#[derive(Debug)]
pub struct ScanChain<T: Coordinate> {
    filters: Vec<Box<dyn AnnotationFilter<T>>>,
}

impl<T: Coordinate> ScanChain<T> {
    /// True if every filter accepts, stopping at the first rejection
    pub fn accepts(&mut self, annotation: &Annotation<T>) -> bool {
        self.filters.iter_mut().all(|f| f.accepts(annotation))
    }
}
