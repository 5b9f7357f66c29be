//! Document validation against JSON Schemas, backed by `jsonschema`.

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;

use crate::error::{InstanceError, SchemaError};

/// Check that a schema compiles.
///
/// # Errors
///
/// Returns `InstanceError::InvalidSchema` if `jsonschema` rejects the schema.
pub fn check_schema(schema: &Value) -> Result<(), InstanceError> {
    jsonschema::validator_for(schema)
        .map(|_| ())
        .map_err(|e| InstanceError::InvalidSchema {
            message: e.to_string(),
        })
}

/// Validate a document, collecting every error.
///
/// Missing required properties are reported against the property path
/// (`/name`) rather than the enclosing object, so they can be attributed to
/// the field that is missing.
///
/// # Errors
///
/// Returns `InstanceError::InvalidSchema` if the schema does not compile.
pub fn validate_document(schema: &Value, document: &Value) -> Result<Vec<SchemaError>, InstanceError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| InstanceError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors = validator
        .iter_errors(document)
        .map(|e| {
            let path = e.instance_path.to_string();
            let message = e.to_string();
            match &e.kind {
                ValidationErrorKind::Required {
                    property: Value::String(property),
                } => SchemaError {
                    path: format!("{}/{}", path, escape_pointer(property)),
                    message,
                },
                _ => SchemaError { path, message },
            }
        })
        .collect();

    Ok(errors)
}

/// Escape a single JSON Pointer reference token (RFC 6901).
pub fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a single JSON Pointer reference token (RFC 6901).
pub fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
