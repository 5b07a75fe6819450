//! Script-backed predicate filter

use std::sync::Arc;

use tracing::warn;

use annostore_core::{Annotation, AnnotationFilter, Coordinate};

use crate::error::ScriptError;
use crate::script::CompiledScript;

/// Accepts annotations for which a compiled script evaluates to `true`
///
/// Fail-closed: if the script errors or returns a non-boolean, the failure is
/// logged and the annotation is rejected. Errors never leave `accepts`.
#[derive(Debug, Clone)]
pub struct ScriptableFilter {
    script: Arc<CompiledScript>,
}

impl ScriptableFilter {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "script";

    /// Compile `source` into a filter
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Parse` if the script does not compile.
    pub fn new(source: impl Into<String>) -> Result<Self, ScriptError> {
        Ok(Self {
            script: Arc::new(CompiledScript::compile(source)?),
        })
    }

    /// Script this filter evaluates
    pub fn script(&self) -> &CompiledScript {
        &self.script
    }
}

impl<T: Coordinate> AnnotationFilter<T> for ScriptableFilter {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn accepts(&mut self, annotation: &Annotation<T>) -> bool {
        match self.script.evaluate(annotation) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(
                    script = self.script.source(),
                    group = annotation.group(),
                    timestamp = annotation.timestamp(),
                    error = %e,
                    "script evaluation failed, rejecting annotation"
                );
                false
            }
        }
    }

    fn fresh(&self) -> Box<dyn AnnotationFilter<T>> {
        Box::new(self.clone())
    }
}
