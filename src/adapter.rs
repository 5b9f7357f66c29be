//! Model kinds and the adapter interface each kind implements.
//!
//! Every supported declaration kind is a variant of [`ModelClass`]. Each
//! variant has one [`ModelAdapter`] implementation that reads its native
//! declarations; the normalizers in `field.rs` and `model.rs` only ever talk
//! to the adapter traits.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::constraints::Constraints;
use crate::error::IntrospectError;
use crate::record::{RecordAdapter, RecordDef};
use crate::schema::SchemaAdapter;
use crate::types::ModelKind;

/// A model declaration that can be introspected.
#[derive(Debug, Clone)]
pub enum ModelClass {
    /// A Rust-declared structured record.
    Record(Arc<RecordDef>),
    /// A JSON Schema document. Only object schemas with `properties` are supported.
    Schema(Arc<Value>),
}

impl ModelClass {
    /// The declaration kind of this model.
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelClass::Record(_) => ModelKind::Record,
            ModelClass::Schema(_) => ModelKind::Schema,
        }
    }

    /// Resolve the adapter for this model.
    ///
    /// # Errors
    ///
    /// Returns `IntrospectError::UnsupportedModel` if the declaration does
    /// not expose field declarations.
    pub(crate) fn adapter(&self) -> Result<Box<dyn ModelAdapter + '_>, IntrospectError> {
        match self {
            ModelClass::Record(def) => Ok(Box::new(RecordAdapter::new(def))),
            ModelClass::Schema(schema) => Ok(Box::new(SchemaAdapter::detect(schema)?)),
        }
    }
}

impl From<RecordDef> for ModelClass {
    fn from(def: RecordDef) -> Self {
        ModelClass::Record(Arc::new(def))
    }
}

impl From<Arc<RecordDef>> for ModelClass {
    fn from(def: Arc<RecordDef>) -> Self {
        ModelClass::Record(def)
    }
}

impl From<Value> for ModelClass {
    fn from(schema: Value) -> Self {
        ModelClass::Schema(Arc::new(schema))
    }
}

impl From<Arc<Value>> for ModelClass {
    fn from(schema: Arc<Value>) -> Self {
        ModelClass::Schema(schema)
    }
}

/// Model-level reads, implemented once per declaration kind.
pub(crate) trait ModelAdapter {
    fn name(&self) -> String;

    /// Explicit title, if the declaration carries one.
    fn title(&self) -> Option<String>;

    fn description(&self) -> Option<String>;

    fn frozen(&self) -> bool;

    /// Class-level metadata not captured by another slot.
    fn metadata(&self) -> Map<String, Value>;

    /// Field adapters in declaration order.
    fn fields(&self) -> Vec<Box<dyn FieldAdapter + '_>>;
}

/// Field-level reads, implemented once per declaration kind.
///
/// The flag and example methods return `None` when the kind has no
/// first-class slot for them; the normalizer then falls back to the
/// side-channel annotations.
pub(crate) trait FieldAdapter {
    fn name(&self) -> &str;

    fn raw_type(&self) -> String;

    /// Explicit title, if the declaration carries one.
    fn title(&self) -> Option<String>;

    fn description(&self) -> Option<String>;

    /// Side-channel annotations attached to the field.
    fn annotations(&self) -> Map<String, Value>;

    /// Resolved default. `None` means the field has no default.
    fn default(&self) -> Option<Value>;

    fn constraints(&self) -> Constraints;

    fn hidden(&self) -> Option<bool> {
        None
    }

    fn readonly(&self) -> Option<bool> {
        None
    }

    fn deprecated(&self) -> Option<bool> {
        None
    }

    fn examples(&self) -> Option<Vec<Value>> {
        None
    }
}
