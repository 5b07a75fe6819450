//! Core types and traits for the annotation store
//!
//! This crate defines the foundational types used throughout the system:
//! - Coordinate: orderable key with a projection onto the binning axis
//! - Annotation / AnnotationBin: stored records and read-time buckets
//! - BinningScheme: per-level quantization of coordinates into buckets
//! - FilterConfig: declarative filter configuration tree
//! - AnnotationError: error type surfaced to callers
//! - Traits: AnnotationFilter, AnnotationBackend, AnnotationService

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotation;
pub mod binning;
pub mod coordinate;
pub mod error;
pub mod filter_config;
pub mod traits;

pub use annotation::{Annotation, AnnotationBin, BinKey};
pub use binning::{BinningScheme, DEFAULT_MAX_LEVEL, MAX_PYRAMID_LEVEL};
pub use coordinate::Coordinate;
pub use error::{AnnotationError, Result};
pub use filter_config::FilterConfig;
pub use traits::{AnnotationBackend, AnnotationFilter, AnnotationService};
