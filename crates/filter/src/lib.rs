//! Filter pipeline for annostore
//!
//! This crate turns declarative `FilterConfig` trees into filter chains:
//! - `script`: sandboxed predicate scripts (`ScriptableFilter`)
//! - `filters`: built-in filter types
//! - `chain`: configured chains and their per-scan instances
//! - `registry`: factories by type name, property resolution and diagnostics
//! - `property`: declared property kinds and deployment-wide defaults

#![warn(missing_docs)]
#![warn(clippy::all)]

mod chain;
pub mod error;
pub mod filters;
pub mod property;
pub mod registry;
pub mod script;

pub use chain::{FilterChain, ScanChain};
pub use error::{FilterBuildError, ScriptError};
pub use filters::{AllOfFilter, AnyOfFilter, GroupRecencyFilter, NotFilter, ScriptableFilter};
pub use property::{PropertyDefaults, PropertyKind, PropertySpec, ResolvedProperties};
pub use registry::{BoxedFilter, BuildOutcome, ChainOutcome, FilterFactory, FilterRegistry, DEFAULT_RECENT_COUNT};
pub use script::CompiledScript;
