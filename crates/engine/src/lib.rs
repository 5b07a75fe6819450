//! Annotation store engine
//!
//! This crate wires storage and filtering into the `AnnotationService`:
//! - `AnnotationStore`: binned reads through a swappable filter chain
//! - `StoreConfig`: binning, filter tree and property defaults from TOML or JSON

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod store;

pub use config::StoreConfig;
pub use store::AnnotationStore;
