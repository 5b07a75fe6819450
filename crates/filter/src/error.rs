//! Error types for filter construction and script evaluation
//!
//! None of these errors reach a reader of the store:
//! - `FilterBuildError` is raised while turning configuration into filters.
//!   The offending node is logged and dropped.
//! - `ScriptError::Eval` is raised while a script judges an annotation.
//!   The annotation is rejected and the scan continues.

use thiserror::Error;

/// Configuration-time failure for one node of a filter tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterBuildError {
    /// No factory is registered under the node's name
    #[error("unknown filter type '{type_name}' at {path}")]
    UnknownFilterType {
        /// Requested type name
        type_name: String,
        /// Location of the node in the configuration tree
        path: String,
    },

    /// A required property has neither a configured value nor a default
    #[error("filter '{type_name}' at {path} is missing required property '{property}'")]
    MissingProperty {
        /// Filter type name
        type_name: String,
        /// Property name
        property: String,
        /// Location of the node in the configuration tree
        path: String,
    },

    /// A property value does not have the declared kind
    #[error("filter '{type_name}' at {path}: property '{property}' expected {expected}, got {actual}")]
    InvalidProperty {
        /// Filter type name
        type_name: String,
        /// Property name
        property: String,
        /// Declared kind
        expected: String,
        /// Kind of the configured value
        actual: String,
        /// Location of the node in the configuration tree
        path: String,
    },

    /// The filter's constructor rejected the resolved configuration
    #[error("failed to construct filter '{type_name}' at {path}: {reason}")]
    FilterConstruction {
        /// Filter type name
        type_name: String,
        /// Constructor failure
        reason: String,
        /// Location of the node in the configuration tree
        path: String,
    },
}

impl FilterBuildError {
    /// Location of the failing node
    pub fn path(&self) -> &str {
        match self {
            FilterBuildError::UnknownFilterType { path, .. }
            | FilterBuildError::MissingProperty { path, .. }
            | FilterBuildError::InvalidProperty { path, .. }
            | FilterBuildError::FilterConstruction { path, .. } => path,
        }
    }
}

/// Script compilation or evaluation failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The script text is not a valid expression
    #[error("parse error at position {position}: {message}")]
    Parse {
        /// Byte offset of the offending token
        position: usize,
        /// What went wrong
        message: String,
    },

    /// The script failed or returned a non-boolean for one annotation
    #[error("evaluation error: {0}")]
    Eval(String),
}

impl ScriptError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        ScriptError::Parse {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn eval(message: impl Into<String>) -> Self {
        ScriptError::Eval(message.into())
    }
}
