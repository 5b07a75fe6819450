//! Core traits for filtering, storage and the service surface
//!
//! These traits are the seams between crates: the filter crate implements
//! `AnnotationFilter`, the storage crate implements `AnnotationBackend`, and
//! the engine implements `AnnotationService` on top of both.

use std::fmt;

use crate::annotation::{Annotation, AnnotationBin, BinKey};
use crate::binning::BinningScheme;
use crate::coordinate::Coordinate;
use crate::error::Result;

/// Predicate applied to annotations at read time
///
/// Filters may keep state while a single read is evaluated (recency
/// counters, for instance). That state never outlives the read: the store
/// calls `fresh` to obtain a clean instance for every scan and evaluates the
/// shared, configured instance only through those copies.
///
/// `accepts` must not panic and must not fail: a filter that cannot decide
/// rejects.
pub trait AnnotationFilter<T: Coordinate>: Send + Sync + fmt::Debug {
    /// Registered type name, used in logs
    fn name(&self) -> &str;

    /// True if the annotation survives this filter
    fn accepts(&mut self, annotation: &Annotation<T>) -> bool;

    /// A clean instance with any scan-local state reset
    fn fresh(&self) -> Box<dyn AnnotationFilter<T>>;
}

/// Backing storage consumed by the store
///
/// Thread safety: all methods must be safe to call concurrently.
pub trait AnnotationBackend<T: Coordinate>: Send + Sync {
    /// Binning scheme the backend buckets coordinates with
    fn binning(&self) -> &BinningScheme;

    /// Persist annotations. Duplicates are stored as separate records.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the backend cannot accept writes.
    fn put(&self, annotations: &[Annotation<T>]) -> Result<()>;

    /// All annotations whose bucket at `level` lies in `[bucket_start, bucket_stop]`
    ///
    /// Results are ordered by bucket key ascending, then write order.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the scan fails and `InvalidRange` if the
    /// level is not defined by the binning scheme.
    fn scan_range(&self, bucket_start: BinKey, bucket_stop: BinKey, level: u32) -> Result<Vec<Annotation<T>>>;

    /// Delete every stored record matching the identity of each annotation
    ///
    /// Returns the number of records removed. Missing records are not an error.
    fn delete(&self, annotations: &[Annotation<T>]) -> Result<usize>;
}

/// Write, range-read-by-level and remove contract of the annotation store
pub trait AnnotationService<T: Coordinate>: Send + Sync {
    /// Persist one annotation
    fn write_annotation(&self, annotation: Annotation<T>) -> Result<()>;

    /// Persist a batch of annotations
    fn write_annotations(&self, annotations: Vec<Annotation<T>>) -> Result<()>;

    /// Filtered bins intersecting `[start, stop]` at `level`, ascending by key
    ///
    /// Bins left without members after filtering are omitted.
    ///
    /// # Errors
    ///
    /// `InvalidRange` if `start > stop` or the level is undefined;
    /// `StorageUnavailable` if the backing scan fails.
    fn read_annotations(&self, start: &T, stop: &T, level: u32) -> Result<Vec<AnnotationBin<T>>>;

    /// Remove one annotation; a no-op if it is not stored
    fn remove_annotation(&self, annotation: &Annotation<T>) -> Result<()>;

    /// Remove a batch of annotations
    fn remove_annotations(&self, annotations: &[Annotation<T>]) -> Result<()>;
}
