//! Storage layer for the annotation store
//!
//! This crate implements the backing scan collaborator:
//! - MemoryBackend: BTreeMap-based storage with RwLock, keyed by coordinate ordinal
//! - testing::UnavailableBackend: a backend that always fails, for error-path tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod testing;

pub use memory::MemoryBackend;
