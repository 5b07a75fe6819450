//! Coordinate types
//!
//! A coordinate is whatever the caller keys annotations by: a tile index,
//! a timestamp, a sequence number. The store only needs two things from it:
//! a total order and an order-preserving projection onto a `u64` axis that
//! the binning scheme quantizes.

use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::hash::Hash;

/// A totally ordered annotation coordinate
///
/// ## Invariant
///
/// `ordinal` must preserve order: `a <= b` implies `a.ordinal() <= b.ordinal()`.
/// Range reads rely on this to turn a bucket range back into a contiguous
/// ordinal range.
pub trait Coordinate: Clone + Ord + Hash + Debug + Send + Sync + 'static {
    /// Position of this coordinate on the binning axis
    fn ordinal(&self) -> u64;

    /// Value filter scripts see as `annotation.coordinate`
    ///
    /// Defaults to the ordinal. Types whose ordinal is a re-encoding
    /// override it so scripts compare against the natural value.
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.ordinal())
    }
}

impl Coordinate for u64 {
    fn ordinal(&self) -> u64 {
        *self
    }
}

impl Coordinate for u32 {
    fn ordinal(&self) -> u64 {
        u64::from(*self)
    }
}

impl Coordinate for i64 {
    /// Flips the sign bit so negative values sort before positive ones
    fn ordinal(&self) -> u64 {
        (*self as u64) ^ (1 << 63)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(*self)
    }
}

impl Coordinate for DateTime<Utc> {
    /// Milliseconds since the Unix epoch; instants before the epoch clamp to 0
    fn ordinal(&self) -> u64 {
        u64::try_from(self.timestamp_millis()).unwrap_or(0)
    }

    /// Signed milliseconds, so pre-epoch instants stay distinguishable
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.timestamp_millis())
    }
}
