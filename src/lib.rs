//! Annostore - indexed annotation store with level binning
//!
//! Annotations are records keyed by an orderable coordinate. Reads return
//! them grouped into bins at a chosen level of resolution, after passing a
//! configurable chain of filters.
//!
//! # Quick Start
//!
//! ```ignore
//! use annostore::{Annotation, AnnotationService, AnnotationStore, BinningScheme, FilterConfig, MemoryBackend};
//!
//! let backend = MemoryBackend::<u64>::new(BinningScheme::widths([(1, 5), (2, 10)])?)?;
//! let store = AnnotationStore::new(backend);
//! store.reconfigure(&[FilterConfig::new("most_recent_by_group").with_property("count", 2)]);
//!
//! store.write_annotation(Annotation::new(12u64, "reviewer", serde_json::json!({"note": "ok"}), 1))?;
//! let bins = store.read_annotations(&10, &15, 1)?;
//! ```
//!
//! # Architecture
//!
//! - `annostore-core`: data model, binning schemes, errors and the trait seams
//! - `annostore-storage`: the in-memory backend
//! - `annostore-filter`: filters, scripts and the filter registry
//! - `annostore-engine`: the store and its configuration

pub use annostore_core::{
    Annotation, AnnotationBackend, AnnotationBin, AnnotationError, AnnotationFilter, AnnotationService,
    BinKey, BinningScheme, Coordinate, FilterConfig, Result,
};
pub use annostore_engine::{AnnotationStore, StoreConfig};
pub use annostore_filter::{
    CompiledScript, FilterBuildError, FilterChain, FilterFactory, FilterRegistry, PropertyDefaults,
    PropertyKind, PropertySpec, ResolvedProperties, ScriptError,
};
pub use annostore_storage::MemoryBackend;

/// Built-in filter types
pub mod filters {
    pub use annostore_filter::filters::*;
}
