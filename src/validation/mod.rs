//! Assertion and cardinality checking for archetyped objects.

pub mod validator;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use validator::ArchetypeValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationErrorCode {
    Required = 1001,
    MaxLength = 1002,
    Pattern = 1003,
    Range = 1004,
    Lookup = 1005,
    MinCardinality = 1006,
    MaxCardinality = 1007,
    ArchetypeRange = 1008,
    TypeMismatch = 1009,
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VAL{:04}", *self as u16)
    }
}

/// A single failed check on one node of one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Short name of the object the node belongs to.
    pub archetype: String,
    pub node: String,
    pub code: ValidationErrorCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        archetype: impl Into<String>,
        node: impl Into<String>,
        code: ValidationErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            archetype: archetype.into(),
            node: node.into(),
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{}: {}",
            self.code, self.archetype, self.node, self.message
        )
    }
}

/// Collects errors while walking an object and its children.
#[derive(Debug, Default)]
pub struct ValidationContext {
    archetype_stack: Vec<String>,
    errors: Vec<ValidationError>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a (possibly nested) object.
    pub fn push_archetype(&mut self, short_name: &str) {
        self.archetype_stack.push(short_name.to_string());
    }

    pub fn pop_archetype(&mut self) {
        self.archetype_stack.pop();
    }

    pub fn current_archetype(&self) -> &str {
        self.archetype_stack.last().map(String::as_str).unwrap_or("")
    }

    pub fn add_error(
        &mut self,
        node: &str,
        code: ValidationErrorCode,
        message: impl Into<String>,
    ) {
        let error = ValidationError::new(self.current_archetype(), node, code, message);
        tracing::debug!("Validation error: {}", error);
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}
