use thiserror::Error;

use crate::validation::ValidationError;

/// Error codes for property resolution failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyResolverErrorCode {
    /// PR1001: No node of that name on a traversable object
    InvalidProperty = 1001,
    /// PR1002: Attempted traversal past a leaf value
    InvalidObject = 1002,
    /// PR1003: A non-null reference could not be dereferenced
    ObjectNotFound = 1003,
    /// PR1004: The path expression is malformed
    InvalidPath = 1004,
    /// PR1005: Collection index out of range
    InvalidIndex = 1005,
}

impl std::fmt::Display for PropertyResolverErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PR{:04}", *self as u32)
    }
}

/// A failed property resolution, carrying the offending path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message} ({path})")]
pub struct PropertyResolverError {
    pub code: PropertyResolverErrorCode,
    pub path: String,
    pub message: String,
}

impl PropertyResolverError {
    pub fn new(
        code: PropertyResolverErrorCode,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_property(path: impl Into<String>) -> Self {
        Self::new(
            PropertyResolverErrorCode::InvalidProperty,
            path,
            "invalid property",
        )
    }

    pub fn invalid_object(path: impl Into<String>) -> Self {
        Self::new(
            PropertyResolverErrorCode::InvalidObject,
            path,
            "cannot traverse a non-object value",
        )
    }

    pub fn object_not_found(path: impl Into<String>, reference: impl std::fmt::Display) -> Self {
        Self::new(
            PropertyResolverErrorCode::ObjectNotFound,
            path,
            format!("referenced object {reference} not found"),
        )
    }

    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(PropertyResolverErrorCode::InvalidPath, path, message)
    }

    pub fn invalid_index(path: impl Into<String>, index: usize, len: usize) -> Self {
        Self::new(
            PropertyResolverErrorCode::InvalidIndex,
            path,
            format!("index {index} out of range for collection of {len}"),
        )
    }
}

#[derive(Error, Debug)]
pub enum ArchetypeError {
    #[error(transparent)]
    PropertyResolver(#[from] PropertyResolverError),

    #[error("Validation failed with {} error(s): {}", errors.len(), summarize(errors))]
    Validation { errors: Vec<ValidationError> },

    #[error("Archetype not found: {short_name}")]
    ArchetypeNotFound { short_name: String },

    #[error("Invalid archetype {archetype}: {message}")]
    InvalidArchetype { archetype: String, message: String },

    #[error("Invalid archetype id: {id}")]
    InvalidArchetypeId { id: String },

    #[error("Cannot convert {value} to {expected} for node {node}")]
    TypeCoercion {
        node: String,
        expected: String,
        value: String,
    },

    #[error("Invalid collection operation on node {node}: {message}")]
    InvalidCollectionOperation { node: String, message: String },

    #[error("Object not found: {reference}")]
    ObjectNotFound { reference: String },

    #[error("Object {reference} has been modified: expected version {expected}, found {found}")]
    StaleObject {
        reference: String,
        expected: i64,
        found: i64,
    },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Assembly error: {message}")]
    Assembly { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ArchetypeError>;

impl ArchetypeError {
    pub fn archetype_not_found<S: Into<String>>(short_name: S) -> Self {
        Self::ArchetypeNotFound {
            short_name: short_name.into(),
        }
    }

    pub fn invalid_archetype<S: Into<String>>(archetype: S, message: S) -> Self {
        Self::InvalidArchetype {
            archetype: archetype.into(),
            message: message.into(),
        }
    }

    pub fn type_coercion<S: Into<String>>(node: S, expected: S, value: S) -> Self {
        Self::TypeCoercion {
            node: node.into(),
            expected: expected.into(),
            value: value.into(),
        }
    }

    pub fn invalid_collection_operation<S: Into<String>>(node: S, message: S) -> Self {
        Self::InvalidCollectionOperation {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn object_not_found(reference: impl std::fmt::Display) -> Self {
        Self::ObjectNotFound {
            reference: reference.to_string(),
        }
    }

    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    pub fn assembly<S: Into<String>>(message: S) -> Self {
        Self::Assembly {
            message: message.into(),
        }
    }

    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self::Validation { errors }
    }

    /// The property resolution error code, if this is a resolution failure.
    pub fn resolver_code(&self) -> Option<PropertyResolverErrorCode> {
        match self {
            ArchetypeError::PropertyResolver(e) => Some(e.code),
            _ => None,
        }
    }

    /// The validation errors, if this is a validation failure.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            ArchetypeError::Validation { errors } => errors,
            _ => &[],
        }
    }
}
