//! Error types for model introspection, schema loading and instance bindings.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the introspection entry points.
#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error("unsupported model: {reason}")]
    UnsupportedModel { reason: String },
}

/// Errors during schema loading.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from looking up fields or attributes through a binding.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("field '{field}' not found in model '{model}'")]
    FieldNotFound { field: String, model: String },

    #[error("instance of '{model}' has no attribute '{attribute}'")]
    AttributeNotFound { attribute: String, model: String },
}

/// Errors raised by the bundled instance types when an assignment is rejected.
#[derive(Debug, Error)]
pub enum AssignError {
    #[error("cannot assign to field '{field}': model '{model}' is frozen")]
    Frozen { model: String, field: String },

    #[error("cannot assign to read-only field '{field}'")]
    ReadOnly { field: String },

    #[error("'{model}' has no field '{field}'")]
    UnknownAttribute { model: String, field: String },

    #[error("invalid value for '{field}': {}", errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Invalid {
        field: String,
        errors: Vec<SchemaError>,
    },
}

/// Errors constructing an instance from raw values.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("missing required field '{field}' for '{model}'")]
    MissingField { model: String, field: String },

    #[error("unexpected field '{field}' for '{model}'")]
    UnexpectedField { model: String, field: String },

    #[error("instance values must be a JSON object, got {actual}")]
    NotAnObject { actual: String },

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error(transparent)]
    Unsupported(#[from] IntrospectError),
}

/// Single validation error with path context.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl IntrospectError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

impl InstanceError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl BindingError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

impl AssignError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AssignError::Invalid { .. } => 1,
            _ => 2,
        }
    }
}
