//! Embedded predicate language
//!
//! Scripts are small boolean expressions over one annotation, bound to the
//! variable `annotation`:
//!
//! ```text
//! annotation.payload.priority >= 2 && !starts_with(annotation.group, 'draft')
//! ```
//!
//! The language is deliberately closed: no assignment, loops, host access or
//! user-defined functions. Scripts are length- and depth-limited and compiled
//! once; evaluation only walks the compiled tree.

mod eval;
mod lexer;
mod parser;

use std::fmt;

use annostore_core::{Annotation, Coordinate};

use crate::error::ScriptError;

pub use parser::{INPUT_VARIABLE, MAX_NESTING_DEPTH, MAX_SCRIPT_LENGTH};

/// A compiled predicate script
#[derive(Clone, PartialEq)]
pub struct CompiledScript {
    source: String,
    expr: parser::Expr,
}

impl CompiledScript {
    /// Compile a script
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Parse` if the text is not a valid expression.
    pub fn compile(source: impl Into<String>) -> Result<Self, ScriptError> {
        let source = source.into();
        let expr = parser::parse(&source)?;
        Ok(Self { source, expr })
    }

    /// Script text as written
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate the script against an annotation
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Eval` if evaluation fails or the result is not a boolean.
    pub fn evaluate<T: Coordinate>(&self, annotation: &Annotation<T>) -> Result<bool, ScriptError> {
        let value = eval::evaluate(&self.expr, annotation)?;
        value.as_bool().ok_or_else(|| {
            ScriptError::eval(format!(
                "script returned {}, expected boolean",
                eval::type_name(&value)
            ))
        })
    }
}

impl fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledScript")
            .field("source", &self.source)
            .finish()
    }
}
