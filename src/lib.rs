//! Schema Bind
//!
//! Normalized field metadata and live instance bindings for form and UI code.
//!
//! Models are declared either as Rust records ([`RecordDef`]) or as JSON
//! Schema object documents. Introspection turns either kind into the same
//! [`PyModel`] / [`PyField`] shape; bindings pair that metadata with a live
//! instance so values can be read and written by field name.
//!
//! # Example
//!
//! ```
//! use schema_bind::{bind_model, get_model, FieldFilter, ModelClass, SchemaInstance};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "title": "User",
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string" },
//!         "email": { "type": "string", "field_type": "email" },
//!         "age": { "type": "integer", "minimum": 0, "default": 30 }
//!     },
//!     "required": ["name", "email"]
//! });
//!
//! let model = get_model(&ModelClass::from(schema.clone())).unwrap();
//! assert_eq!(model.get_fields(&FieldFilter::new().required(true)).len(), 2);
//! assert_eq!(model.fields[1].field_type.as_deref(), Some("email"));
//!
//! let instance = SchemaInstance::new(schema, json!({ "name": "Ada", "email": "ada@example.com" })).unwrap();
//! let binding = bind_model(instance).unwrap();
//! assert_eq!(binding["age"].value().unwrap(), json!(30));
//!
//! binding["age"].set_value(json!(36)).unwrap();
//! assert!(binding["age"].set_value(json!(-1)).is_err());
//! ```
//!
//! # Side-channel annotations
//!
//! | Key | Effect |
//! |-----|--------|
//! | `field_type` | Custom field-type tag (`"email"`, `"password"`, ...) |
//! | `hidden` | Hide from presentation |
//! | `readonly` | Not editable (JSON Schema also honours `readOnly`) |
//! | `deprecated` | Marked deprecated |
//! | `placeholder` | Placeholder text; defaults to the first example |
//! | `examples` | Example values |
//!
//! Any other annotation is kept in the field's `metadata`.

mod adapter;
mod binding;
mod constraints;
mod error;
mod field;
mod loader;
mod model;
mod record;
mod schema;
mod types;
mod validator;

pub use adapter::ModelClass;
pub use binding::{bind_model, FieldBinding, Instance, ModelBinding, ModelValidationResult};
pub use constraints::{Constraint, Constraints};
pub use error::{AssignError, BindingError, InstanceError, IntrospectError, LoadError, SchemaError};
pub use field::{get_fields, PyField};
pub use loader::{is_url, load_document, load_document_auto, load_document_str, DocumentSource};
pub use model::{get_model, FieldFilter, PyModel};
pub use record::{short_type_name, DefaultFactory, FieldDecl, RecordDef, RecordInstance};
pub use schema::{SchemaInstance, DEFAULT_MODEL_NAME};
pub use types::{humanize, ModelKind, ANNOTATION_KEYS};
pub use validator::validate_document;

#[cfg(feature = "remote")]
pub use loader::load_document_url;
