//! AnnotationStore: binned reads through a swappable filter chain
//!
//! The store sits between callers and an `AnnotationBackend`:
//! - writes and removals pass straight through to the backend
//! - reads validate the range, translate it to a bucket range at the
//!   requested level, scan, filter and regroup survivors into bins
//!
//! # Filter chain
//!
//! The active chain is held as `RwLock<Arc<FilterChain<T>>>`. A read clones
//! the `Arc` once and evaluates that snapshot through a fresh `ScanChain`,
//! so a concurrent `reconfigure` never changes a read that is in flight.
//! Reconfiguration builds the new chain before taking the write lock.
//!
//! # Evaluation order
//!
//! Candidates are fed to the chain newest first (timestamp descending,
//! ties in write order) so order-sensitive filters such as
//! `most_recent_by_group` see the most recent annotations first. Survivors
//! are then returned in scan order: bucket ascending, then write order.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use annostore_core::{
    Annotation, AnnotationBackend, AnnotationBin, AnnotationError, AnnotationService, BinningScheme,
    Coordinate, FilterConfig, Result,
};
use annostore_filter::{FilterBuildError, FilterChain, FilterRegistry};
use annostore_storage::MemoryBackend;

use crate::config::StoreConfig;

/// Annotation store over a backend `B`
pub struct AnnotationStore<T: Coordinate, B: AnnotationBackend<T>> {
    backend: B,
    registry: FilterRegistry<T>,
    chain: RwLock<Arc<FilterChain<T>>>,
}

impl<T: Coordinate, B: AnnotationBackend<T>> AnnotationStore<T, B> {
    /// Store with the built-in filter types and an empty chain
    pub fn new(backend: B) -> Self {
        Self::with_registry(backend, FilterRegistry::with_builtins())
    }

    /// Store using a caller-supplied registry and an empty chain
    pub fn with_registry(backend: B, registry: FilterRegistry<T>) -> Self {
        Self {
            backend,
            registry,
            chain: RwLock::new(Arc::new(FilterChain::empty())),
        }
    }

    /// Store with the built-in filter types and a chain built from `filters`
    ///
    /// Returns the store together with the diagnostics of any dropped node.
    pub fn with_filters(backend: B, filters: &[FilterConfig]) -> (Self, Vec<FilterBuildError>) {
        let store = Self::new(backend);
        let diagnostics = store.reconfigure(filters);
        (store, diagnostics)
    }

    /// Rebuild the filter chain from configuration and swap it in
    ///
    /// Reads already in flight finish with the chain they started with.
    /// Nodes that fail to build are dropped and reported; the remaining
    /// nodes still form the new chain.
    pub fn reconfigure(&self, filters: &[FilterConfig]) -> Vec<FilterBuildError> {
        let outcome = self.registry.build_chain(filters);
        info!(
            filters = outcome.chain.len(),
            dropped = outcome.diagnostics.len(),
            "installing filter chain"
        );
        self.set_filter_chain(outcome.chain);
        outcome.diagnostics
    }

    /// Swap in an already built chain
    pub fn set_filter_chain(&self, chain: FilterChain<T>) {
        let chain = Arc::new(chain);
        *self.chain.write() = chain;
    }

    /// Snapshot of the active filter chain
    pub fn filter_chain(&self) -> Arc<FilterChain<T>> {
        Arc::clone(&self.chain.read())
    }

    /// Binning scheme of the backend
    pub fn binning(&self) -> &BinningScheme {
        self.backend.binning()
    }

    /// The filter registry used by `reconfigure`
    pub fn registry(&self) -> &FilterRegistry<T> {
        &self.registry
    }

    /// The backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn check_range(&self, start: &T, stop: &T, level: u32) -> Result<(u64, u64)> {
        if start > stop {
            return Err(AnnotationError::invalid_range(format!(
                "start {:?} is after stop {:?}",
                start, stop
            )));
        }
        let binning = self.backend.binning();
        if !binning.supports_level(level) {
            return Err(AnnotationError::invalid_range(format!(
                "level {} is not defined by the binning scheme",
                level
            )));
        }
        let bucket_start = binning.bucket(start.ordinal(), level)?;
        let bucket_stop = binning.bucket(stop.ordinal(), level)?;
        Ok((bucket_start, bucket_stop))
    }
}

impl<T: Coordinate> AnnotationStore<T, MemoryBackend<T>> {
    /// In-memory store built from configuration
    ///
    /// Property defaults from the configuration are installed in the
    /// registry before the chain is built.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBinning` if the binning scheme is malformed.
    pub fn from_config(config: &StoreConfig) -> Result<(Self, Vec<FilterBuildError>)> {
        let backend = MemoryBackend::new(config.binning.clone())?;
        let mut registry = FilterRegistry::with_builtins();
        registry.set_defaults(config.property_defaults());
        let store = Self::with_registry(backend, registry);
        let diagnostics = store.reconfigure(&config.filters);
        Ok((store, diagnostics))
    }
}

impl<T: Coordinate, B: AnnotationBackend<T>> AnnotationService<T> for AnnotationStore<T, B> {
    fn write_annotation(&self, annotation: Annotation<T>) -> Result<()> {
        self.backend.put(std::slice::from_ref(&annotation))
    }

    fn write_annotations(&self, annotations: Vec<Annotation<T>>) -> Result<()> {
        if annotations.is_empty() {
            return Ok(());
        }
        debug!(count = annotations.len(), "writing annotations");
        self.backend.put(&annotations)
    }

    fn read_annotations(&self, start: &T, stop: &T, level: u32) -> Result<Vec<AnnotationBin<T>>> {
        let (bucket_start, bucket_stop) = self.check_range(start, stop, level)?;
        let candidates = self.backend.scan_range(bucket_start, bucket_stop, level)?;
        let chain = self.filter_chain();

        // Newest first; sort_by is stable so equal timestamps keep write order
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| candidates[b].timestamp().cmp(&candidates[a].timestamp()));

        let mut scan = chain.instantiate();
        let mut keep = vec![false; candidates.len()];
        for i in order {
            keep[i] = scan.accepts(&candidates[i]);
        }

        let binning = self.backend.binning();
        let mut bins: Vec<AnnotationBin<T>> = Vec::new();
        let scanned = candidates.len();
        for (annotation, kept) in candidates.into_iter().zip(keep) {
            if !kept {
                continue;
            }
            let key = binning.bucket(annotation.coordinate().ordinal(), level)?;
            match bins.last_mut() {
                Some(bin) if bin.key() == key => bin.push(annotation),
                _ => {
                    let mut bin = AnnotationBin::new(key, level);
                    bin.push(annotation);
                    bins.push(bin);
                }
            }
        }

        debug!(
            level,
            bucket_start,
            bucket_stop,
            scanned,
            bins = bins.len(),
            filters = chain.len(),
            "read annotations"
        );
        Ok(bins)
    }

    fn remove_annotation(&self, annotation: &Annotation<T>) -> Result<()> {
        self.remove_annotations(std::slice::from_ref(annotation))
    }

    fn remove_annotations(&self, annotations: &[Annotation<T>]) -> Result<()> {
        let removed = self.backend.delete(annotations)?;
        debug!(requested = annotations.len(), removed, "removed annotations");
        Ok(())
    }
}

impl<T: Coordinate, B: AnnotationBackend<T>> fmt::Debug for AnnotationStore<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("binning", self.backend.binning())
            .field("filters", &self.chain.read().names())
            .finish()
    }
}
