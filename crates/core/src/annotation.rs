//! Annotation records and read-time bins

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// Bucket identifier of a coordinate at a given level
pub type BinKey = u64;

/// A single stored annotation
///
/// Annotations are immutable once written. Replacing one is a remove
/// followed by a write; there are no setters.
///
/// Identity is `(coordinate, group, timestamp)`: removal matches on exactly
/// these three fields and ignores the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation<T> {
    coordinate: T,
    group: String,
    payload: serde_json::Value,
    timestamp: u64,
}

impl<T: Coordinate> Annotation<T> {
    /// Create an annotation
    ///
    /// `timestamp` is the write timestamp used by recency filtering.
    pub fn new(
        coordinate: T,
        group: impl Into<String>,
        payload: serde_json::Value,
        timestamp: u64,
    ) -> Self {
        Self {
            coordinate,
            group: group.into(),
            payload,
            timestamp,
        }
    }

    /// Coordinate the annotation is keyed by
    pub fn coordinate(&self) -> &T {
        &self.coordinate
    }

    /// Group key
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Opaque payload
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Write timestamp
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Identity tuple used for removal
    pub fn identity(&self) -> (&T, &str, u64) {
        (&self.coordinate, &self.group, self.timestamp)
    }

    /// True if both annotations denote the same stored record
    pub fn same_record(&self, other: &Annotation<T>) -> bool {
        self.identity() == other.identity()
    }
}

/// All surviving annotations of one bucket at one level
///
/// Bins are materialized at read time and never persisted.
/// Members keep arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationBin<T> {
    key: BinKey,
    level: u32,
    members: Vec<Annotation<T>>,
}

impl<T: Coordinate> AnnotationBin<T> {
    /// Create an empty bin
    pub fn new(key: BinKey, level: u32) -> Self {
        Self {
            key,
            level,
            members: Vec::new(),
        }
    }

    /// Bucket key
    pub fn key(&self) -> BinKey {
        self.key
    }

    /// Level the bin was materialized at
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Members in arrival order
    pub fn members(&self) -> &[Annotation<T>] {
        &self.members
    }

    /// Consume the bin, returning its members
    pub fn into_members(self) -> Vec<Annotation<T>> {
        self.members
    }

    /// Append a member
    pub fn push(&mut self, annotation: Annotation<T>) {
        self.members.push(annotation);
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the bin has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
