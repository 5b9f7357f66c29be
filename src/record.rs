//! Rust-declared structured records.
//!
//! A [`RecordDef`] is the declaration of a record type: ordered fields with
//! their Rust type, defaults, doc strings, side-channel annotations and
//! constraint markers. [`RecordInstance`] is a dynamic instance of one.
//!
//! ```
//! use schema_bind::{Constraint, FieldDecl, RecordDef};
//! use serde_json::json;
//!
//! let user = RecordDef::new("User")
//!     .doc("A registered user.")
//!     .field(FieldDecl::new::<String>("name"))
//!     .field(
//!         FieldDecl::new::<String>("email")
//!             .annotated(json!({ "field_type": "email" }))
//!             .doc("Primary contact address."),
//!     )
//!     .field(
//!         FieldDecl::new::<i64>("age")
//!             .default_value(30)
//!             .constrain(Constraint::Ge(0.0)),
//!     );
//!
//! assert_eq!(user.fields().len(), 3);
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::adapter::{FieldAdapter, ModelAdapter, ModelClass};
use crate::binding::Instance;
use crate::constraints::{Constraint, Constraints};
use crate::error::{AssignError, InstanceError};
use crate::types::json_type_name;

/// Produces a fresh default value for a field.
pub type DefaultFactory = fn() -> Value;

#[derive(Debug, Clone)]
enum FieldDefault {
    Missing,
    Value(Value),
    Factory(DefaultFactory),
}

/// Declaration of one record field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: String,
    raw_type: String,
    default: FieldDefault,
    doc: Option<String>,
    title: Option<String>,
    description: Option<String>,
    annotations: Map<String, Value>,
    markers: Vec<Constraint>,
}

impl FieldDecl {
    /// Declare a field holding values of Rust type `T`.
    pub fn new<T: ?Sized>(name: impl Into<String>) -> Self {
        Self::with_type(name, short_type_name(std::any::type_name::<T>()))
    }

    /// Declare a field with an explicit type name.
    pub fn with_type(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            default: FieldDefault::Missing,
            doc: None,
            title: None,
            description: None,
            annotations: Map::new(),
            markers: Vec::new(),
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Default computed on each introspection by calling `factory`.
    pub fn default_factory(mut self, factory: DefaultFactory) -> Self {
        self.default = FieldDefault::Factory(factory);
        self
    }

    /// Doc string attached to the declaration. Takes precedence over
    /// [`FieldDecl::description`].
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach side-channel annotations.
    ///
    /// Members of a JSON object are merged into the existing annotations,
    /// later calls overriding earlier keys. Non-object values are ignored.
    pub fn annotated(mut self, annotations: Value) -> Self {
        if let Value::Object(map) = annotations {
            self.annotations.extend(map);
        }
        self
    }

    pub fn constrain(mut self, marker: Constraint) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_type(&self) -> &str {
        &self.raw_type
    }

    /// Returns true if the field declares neither a default nor a factory.
    pub fn is_required(&self) -> bool {
        matches!(self.default, FieldDefault::Missing)
    }

    fn resolve_default(&self) -> Option<Value> {
        match &self.default {
            FieldDefault::Missing => None,
            FieldDefault::Value(value) => Some(value.clone()),
            FieldDefault::Factory(factory) => Some(factory()),
        }
    }
}

/// Declaration of a record type.
#[derive(Debug, Clone)]
pub struct RecordDef {
    name: String,
    doc: Option<String>,
    frozen: bool,
    metadata: Map<String, Value>,
    fields: Vec<FieldDecl>,
}

impl RecordDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            frozen: false,
            metadata: Map::new(),
            fields: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Mark instances immutable after construction.
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Attach class-level metadata. The `title` key sets the model title.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Append a field. Redeclaring a name replaces the earlier declaration
    /// in place.
    pub fn field(mut self, decl: FieldDecl) -> Self {
        match self.fields.iter_mut().find(|f| f.name == decl.name) {
            Some(existing) => *existing = decl,
            None => self.fields.push(decl),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field_decl(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Strip module paths from a Rust type name.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub fn short_type_name(full: &str) -> String {
    fn flush(path: &mut String, out: &mut String) {
        let last = path.rsplit("::").next().unwrap_or_default();
        out.push_str(last);
        path.clear();
    }

    let mut out = String::with_capacity(full.len());
    let mut path = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            path.push(c);
        } else {
            flush(&mut path, &mut out);
            out.push(c);
        }
    }
    flush(&mut path, &mut out);
    out
}

pub(crate) struct RecordAdapter<'a> {
    def: &'a RecordDef,
}

impl<'a> RecordAdapter<'a> {
    pub(crate) fn new(def: &'a RecordDef) -> Self {
        Self { def }
    }
}

impl ModelAdapter for RecordAdapter<'_> {
    fn name(&self) -> String {
        self.def.name.clone()
    }

    fn title(&self) -> Option<String> {
        self.def
            .metadata
            .get("title")
            .and_then(Value::as_str)
            .map(String::from)
    }

    fn description(&self) -> Option<String> {
        self.def.doc.clone()
    }

    fn frozen(&self) -> bool {
        self.def.frozen
    }

    fn metadata(&self) -> Map<String, Value> {
        self.def
            .metadata
            .iter()
            .filter(|(k, _)| k.as_str() != "title")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn fields(&self) -> Vec<Box<dyn FieldAdapter + '_>> {
        self.def
            .fields
            .iter()
            .map(|decl| Box::new(RecordFieldAdapter { decl }) as Box<dyn FieldAdapter + '_>)
            .collect()
    }
}

struct RecordFieldAdapter<'a> {
    decl: &'a FieldDecl,
}

impl FieldAdapter for RecordFieldAdapter<'_> {
    fn name(&self) -> &str {
        &self.decl.name
    }

    fn raw_type(&self) -> String {
        self.decl.raw_type.clone()
    }

    fn title(&self) -> Option<String> {
        self.decl.title.clone()
    }

    fn description(&self) -> Option<String> {
        self.decl
            .doc
            .clone()
            .or_else(|| self.decl.description.clone())
    }

    fn annotations(&self) -> Map<String, Value> {
        self.decl.annotations.clone()
    }

    fn default(&self) -> Option<Value> {
        self.decl.resolve_default()
    }

    fn constraints(&self) -> Constraints {
        Constraints::from_markers(&self.decl.markers)
    }
}

/// A dynamic instance of a [`RecordDef`].
#[derive(Debug, Clone)]
pub struct RecordInstance {
    def: Arc<RecordDef>,
    values: Map<String, Value>,
}

impl RecordInstance {
    /// Construct an instance from a JSON object of field values.
    ///
    /// Absent fields take their default (factories are invoked); absent
    /// required fields and undeclared members are rejected.
    ///
    /// # Errors
    ///
    /// Returns `InstanceError` if `values` is not an object, a required
    /// field is missing, or an undeclared field is present.
    pub fn new(def: impl Into<Arc<RecordDef>>, values: Value) -> Result<Self, InstanceError> {
        let def = def.into();
        let mut given = match values {
            Value::Object(map) => map,
            other => {
                return Err(InstanceError::NotAnObject {
                    actual: json_type_name(&other).to_string(),
                })
            }
        };

        if let Some(unexpected) = given.keys().find(|k| def.field_decl(k).is_none()) {
            return Err(InstanceError::UnexpectedField {
                model: def.name.clone(),
                field: unexpected.clone(),
            });
        }

        let mut resolved = Map::new();
        for decl in &def.fields {
            let value = match given.remove(&decl.name) {
                Some(value) => value,
                None => decl
                    .resolve_default()
                    .ok_or_else(|| InstanceError::MissingField {
                        model: def.name.clone(),
                        field: decl.name.clone(),
                    })?,
            };
            resolved.insert(decl.name.clone(), value);
        }

        Ok(Self {
            def,
            values: resolved,
        })
    }

    pub fn definition(&self) -> &Arc<RecordDef> {
        &self.def
    }

    /// Current field values in declaration order.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl Instance for RecordInstance {
    type Error = AssignError;

    fn model_class(&self) -> ModelClass {
        ModelClass::Record(Arc::clone(&self.def))
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), AssignError> {
        if self.def.frozen {
            return Err(AssignError::Frozen {
                model: self.def.name.clone(),
                field: name.to_string(),
            });
        }
        if self.def.field_decl(name).is_none() {
            return Err(AssignError::UnknownAttribute {
                model: self.def.name.clone(),
                field: name.to_string(),
            });
        }
        trace!(model = %self.def.name, field = name, "assigning record attribute");
        self.values.insert(name.to_string(), value);
        Ok(())
    }
}
