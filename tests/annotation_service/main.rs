//! Annotation Service Tests
//!
//! End-to-end tests of the store through the public facade, organized by concern:
//! - binning: level reads, nesting across levels, coordinate types
//! - filtering: scripts, recency, composites, registry configuration
//! - lifecycle: removal, configuration files, backend failures
//! - concurrency: reads racing writes and reconfiguration

#[path = "../common/mod.rs"]
mod common;

mod binning;
mod concurrency;
mod filtering;
mod lifecycle;
