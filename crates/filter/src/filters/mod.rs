//! Filter implementations
//!
//! - `ScriptableFilter`: evaluates a compiled script per annotation
//! - `GroupRecencyFilter`: keeps the N most recent annotations per group
//! - `AllOfFilter` / `AnyOfFilter` / `NotFilter`: composites over child filters

mod composite;
mod recency;
mod scriptable;

pub use composite::{AllOfFilter, AnyOfFilter, NotFilter};
pub use recency::GroupRecencyFilter;
pub use scriptable::ScriptableFilter;
