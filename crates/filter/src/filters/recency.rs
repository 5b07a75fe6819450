//! Per-group recency filter

use std::collections::HashMap;

use tracing::debug;

use annostore_core::{Annotation, AnnotationFilter, Coordinate};

/// Keeps the `count` most recently written annotations of each group
///
/// The filter is order-sensitive: it accepts the first `count` annotations it
/// sees per group, so candidates must arrive in descending write timestamp
/// order. The store evaluates its chain in that order.
///
/// Counters are scan-local. `fresh` returns an instance with empty counters,
/// and nothing is remembered across reads.
#[derive(Debug, Clone)]
pub struct GroupRecencyFilter {
    count: usize,
    seen: HashMap<String, GroupWindow>,
}

#[derive(Debug, Clone, Copy)]
struct GroupWindow {
    accepted: usize,
    oldest: u64,
}

impl GroupRecencyFilter {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "most_recent_by_group";

    /// Keep at most `count` annotations per group
    pub fn new(count: usize) -> Self {
        Self {
            count,
            seen: HashMap::new(),
        }
    }

    /// Per-group budget
    pub fn count(&self) -> usize {
        self.count
    }
}

impl<T: Coordinate> AnnotationFilter<T> for GroupRecencyFilter {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn accepts(&mut self, annotation: &Annotation<T>) -> bool {
        if self.count == 0 {
            return false;
        }
        let timestamp = annotation.timestamp();
        match self.seen.get_mut(annotation.group()) {
            Some(window) => {
                if timestamp > window.oldest {
                    debug!(
                        group = annotation.group(),
                        timestamp,
                        oldest = window.oldest,
                        "recency filter fed out of timestamp order"
                    );
                }
                if window.accepted >= self.count {
                    return false;
                }
                window.accepted += 1;
                window.oldest = window.oldest.min(timestamp);
                true
            }
            None => {
                self.seen.insert(
                    annotation.group().to_string(),
                    GroupWindow {
                        accepted: 1,
                        oldest: timestamp,
                    },
                );
                true
            }
        }
    }

    fn fresh(&self) -> Box<dyn AnnotationFilter<T>> {
        Box::new(GroupRecencyFilter::new(self.count))
    }
}
