//! MemoryBackend: in-memory annotation backend with BTreeMap and write sequencing
//!
//! This module implements the AnnotationBackend trait using:
//! - `BTreeMap<u64, Vec<StoredAnnotation<T>>>` keyed by coordinate ordinal
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for a global write sequence (arrival order)
//!
//! # Design Notes
//!
//! - **Ordinal keyed**: a bucket range maps to one contiguous ordinal range, so
//!   a level-scoped scan is a single `BTreeMap::range` call
//! - **Sequence before write lock**: sequence numbers are allocated outside the
//!   lock; ordering inside a scan is restored by sorting on them
//! - **Duplicates kept**: writing the same record twice stores two entries

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use annostore_core::{Annotation, AnnotationBackend, BinKey, BinningScheme, Coordinate, Result};

/// An annotation together with its arrival sequence number
#[derive(Debug, Clone)]
struct StoredAnnotation<T> {
    seq: u64,
    annotation: Annotation<T>,
}

/// In-memory backend using BTreeMap with RwLock
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`. Concurrent
/// scans share the read lock.
#[derive(Debug)]
pub struct MemoryBackend<T> {
    /// Ordinal -> annotations stored at coordinates with that ordinal
    data: RwLock<BTreeMap<u64, Vec<StoredAnnotation<T>>>>,
    /// Global write sequence for arrival ordering
    seq: AtomicU64,
    binning: BinningScheme,
}

impl<T: Coordinate> MemoryBackend<T> {
    /// Create an empty backend with the given binning scheme
    ///
    /// # Errors
    ///
    /// Returns `InvalidBinning` if the scheme fails validation.
    pub fn new(binning: BinningScheme) -> Result<Self> {
        binning.validate()?;
        Ok(Self {
            data: RwLock::new(BTreeMap::new()),
            seq: AtomicU64::new(0),
            binning,
        })
    }

    /// Total number of stored records, duplicates included
    pub fn len(&self) -> usize {
        self.data.read().values().map(Vec::len).sum()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }
}

impl<T: Coordinate> Default for MemoryBackend<T> {
    fn default() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            seq: AtomicU64::new(0),
            binning: BinningScheme::default(),
        }
    }
}

impl<T: Coordinate> AnnotationBackend<T> for MemoryBackend<T> {
    fn binning(&self) -> &BinningScheme {
        &self.binning
    }

    fn put(&self, annotations: &[Annotation<T>]) -> Result<()> {
        if annotations.is_empty() {
            return Ok(());
        }
        let stored: Vec<(u64, StoredAnnotation<T>)> = annotations
            .iter()
            .map(|a| {
                (
                    a.coordinate().ordinal(),
                    StoredAnnotation {
                        seq: self.next_seq(),
                        annotation: a.clone(),
                    },
                )
            })
            .collect();

        let mut data = self.data.write();
        for (ordinal, entry) in stored {
            data.entry(ordinal).or_default().push(entry);
        }
        debug!(count = annotations.len(), "stored annotations");
        Ok(())
    }

    fn scan_range(&self, bucket_start: BinKey, bucket_stop: BinKey, level: u32) -> Result<Vec<Annotation<T>>> {
        let (low, _) = self.binning.bucket_bounds(bucket_start, level)?;
        let (_, high) = self.binning.bucket_bounds(bucket_stop, level)?;

        let mut hits: Vec<(BinKey, u64, Annotation<T>)> = Vec::new();
        {
            let data = self.data.read();
            for (ordinal, entries) in data.range(low..=high) {
                let key = self.binning.bucket(*ordinal, level)?;
                hits.extend(entries.iter().map(|e| (key, e.seq, e.annotation.clone())));
            }
        }
        hits.sort_by_key(|(key, seq, _)| (*key, *seq));

        debug!(
            bucket_start,
            bucket_stop,
            level,
            hits = hits.len(),
            "scanned annotation range"
        );
        Ok(hits.into_iter().map(|(_, _, a)| a).collect())
    }

    fn delete(&self, annotations: &[Annotation<T>]) -> Result<usize> {
        let mut data = self.data.write();
        let mut removed = 0;
        for target in annotations {
            let ordinal = target.coordinate().ordinal();
            if let Some(entries) = data.get_mut(&ordinal) {
                let before = entries.len();
                entries.retain(|e| !e.annotation.same_record(target));
                removed += before - entries.len();
                if entries.is_empty() {
                    data.remove(&ordinal);
                }
            }
        }
        debug!(requested = annotations.len(), removed, "deleted annotations");
        Ok(removed)
    }
}
