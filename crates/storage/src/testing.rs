//! Testing utilities for storage failure handling
//!
//! `UnavailableBackend` fails every call with `StorageUnavailable`, which lets
//! callers verify that backend errors propagate unchanged.

use annostore_core::{
    Annotation, AnnotationBackend, AnnotationError, BinKey, BinningScheme, Coordinate, Result,
};

/// Backend that is permanently offline
#[derive(Debug, Clone, Default)]
pub struct UnavailableBackend {
    binning: BinningScheme,
    reason: String,
}

impl UnavailableBackend {
    /// Offline backend reporting `reason` on every call
    pub fn new(binning: BinningScheme, reason: impl Into<String>) -> Self {
        Self {
            binning,
            reason: reason.into(),
        }
    }

    fn fail<R>(&self) -> Result<R> {
        Err(AnnotationError::storage(self.reason.clone()))
    }
}

impl<T: Coordinate> AnnotationBackend<T> for UnavailableBackend {
    fn binning(&self) -> &BinningScheme {
        &self.binning
    }

    fn put(&self, _annotations: &[Annotation<T>]) -> Result<()> {
        self.fail()
    }

    fn scan_range(&self, _bucket_start: BinKey, _bucket_stop: BinKey, _level: u32) -> Result<Vec<Annotation<T>>> {
        self.fail()
    }

    fn delete(&self, _annotations: &[Annotation<T>]) -> Result<usize> {
        self.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_call_fails() {
        let backend = UnavailableBackend::new(BinningScheme::default(), "disk detached");
        let scan: Result<Vec<Annotation<u64>>> = backend.scan_range(0, 1, 0);
        assert_eq!(scan.unwrap_err(), AnnotationError::storage("disk detached"));
        assert!(AnnotationBackend::<u64>::put(&backend, &[]).is_err());
        assert!(AnnotationBackend::<u64>::delete(&backend, &[]).is_err());
    }
}
