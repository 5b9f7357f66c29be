//! Live bindings between model metadata and instances.
//!
//! Bindings share the instance through `Rc<RefCell<_>>`. Reads and writes go
//! straight to the instance, so a value set through one binding is visible
//! through every other handle on the same instance. Holding a `borrow_mut`
//! on the instance while reading or writing through a binding panics.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Index;
use std::rc::Rc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::adapter::ModelClass;
use crate::error::{BindingError, IntrospectError, SchemaError};
use crate::field::PyField;
use crate::model::{get_model, PyModel};
use crate::validator::unescape_pointer;

/// An object whose attributes can be read and written by field name.
pub trait Instance {
    /// Error raised when the instance rejects an assignment.
    type Error: std::error::Error;

    /// The model this instance is an instance of.
    fn model_class(&self) -> ModelClass;

    /// Current value of an attribute, `None` if the instance has no such attribute.
    fn get_attr(&self, name: &str) -> Option<Value>;

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), Self::Error>;

    /// Validate the whole instance with the model's own rules.
    ///
    /// Errors located under `/<field>` are attributed to that field, the
    /// rest are global. The default reports nothing.
    fn validate(&self) -> Vec<SchemaError> {
        Vec::new()
    }
}

/// One field of a model paired with a live instance.
#[derive(Debug)]
pub struct FieldBinding<I> {
    field: PyField,
    instance: Rc<RefCell<I>>,
    validation_errors: Vec<String>,
    /// Ephemeral UI state (dirty flags, focus, ...).
    pub ui_state: Map<String, Value>,
}

impl<I: Instance> FieldBinding<I> {
    pub fn new(field: PyField, instance: Rc<RefCell<I>>) -> Self {
        Self {
            field,
            instance,
            validation_errors: Vec::new(),
            ui_state: Map::new(),
        }
    }

    pub fn field(&self) -> &PyField {
        &self.field
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn instance(&self) -> &Rc<RefCell<I>> {
        &self.instance
    }

    /// Read the field's current value from the instance.
    ///
    /// # Errors
    ///
    /// Returns `BindingError::AttributeNotFound` if the instance has no
    /// attribute with the field's name.
    pub fn value(&self) -> Result<Value, BindingError> {
        self.instance
            .borrow()
            .get_attr(&self.field.name)
            .ok_or_else(|| BindingError::AttributeNotFound {
                attribute: self.field.name.clone(),
                model: self.field.parent_model.clone(),
            })
    }

    /// Write the field's value on the instance.
    ///
    /// # Errors
    ///
    /// Whatever the instance raises when rejecting the assignment, unchanged.
    pub fn set_value(&self, value: Value) -> Result<(), I::Error> {
        trace!(field = %self.field.name, "setting bound value");
        self.instance
            .borrow_mut()
            .set_attr(&self.field.name, value)
    }

    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }

    /// Replace the stored validation errors.
    pub fn set_validation_errors(&mut self, errors: Vec<String>) {
        self.validation_errors = errors;
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

/// Outcome of [`ModelBinding::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelValidationResult {
    pub is_valid: bool,
    /// Messages per field name.
    pub field_errors: BTreeMap<String, Vec<String>>,
    /// Messages not attributable to a single field.
    pub global_errors: Vec<String>,
}

/// A model paired with a live instance, with one [`FieldBinding`] per field.
#[derive(Debug)]
pub struct ModelBinding<I> {
    model: PyModel,
    instance: Rc<RefCell<I>>,
    fields: Vec<FieldBinding<I>>,
    /// Ephemeral UI state for the whole form.
    pub ui_state: Map<String, Value>,
}

impl<I: Instance> ModelBinding<I> {
    /// Bind an already introspected model to a shared instance.
    pub fn new(model: PyModel, instance: Rc<RefCell<I>>) -> Self {
        let fields = model
            .fields
            .iter()
            .map(|f| FieldBinding::new(f.clone(), Rc::clone(&instance)))
            .collect();
        Self {
            model,
            instance,
            fields,
            ui_state: Map::new(),
        }
    }

    /// Introspect the instance's model and bind it.
    ///
    /// # Errors
    ///
    /// Returns `IntrospectError::UnsupportedModel` if the instance's model
    /// cannot be introspected.
    pub fn from_instance(instance: I) -> Result<Self, IntrospectError> {
        Self::from_shared(Rc::new(RefCell::new(instance)))
    }

    /// Like [`ModelBinding::from_instance`], for an instance the caller keeps
    /// a handle on.
    ///
    /// # Errors
    ///
    /// Returns `IntrospectError::UnsupportedModel` if the instance's model
    /// cannot be introspected.
    pub fn from_shared(instance: Rc<RefCell<I>>) -> Result<Self, IntrospectError> {
        let class = instance.borrow().model_class();
        let model = get_model(&class)?;
        Ok(Self::new(model, instance))
    }

    pub fn model(&self) -> &PyModel {
        &self.model
    }

    pub fn instance(&self) -> &Rc<RefCell<I>> {
        &self.instance
    }

    pub fn fields(&self) -> &[FieldBinding<I>] {
        &self.fields
    }

    /// Look up a field binding by name.
    ///
    /// # Errors
    ///
    /// Returns `BindingError::FieldNotFound` if the model has no such field.
    pub fn get_field_binding(&self, name: &str) -> Result<&FieldBinding<I>, BindingError> {
        self.fields
            .iter()
            .find(|b| b.field.name == name)
            .ok_or_else(|| self.field_not_found(name))
    }

    /// Mutable variant of [`ModelBinding::get_field_binding`].
    ///
    /// # Errors
    ///
    /// Returns `BindingError::FieldNotFound` if the model has no such field.
    pub fn get_field_binding_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut FieldBinding<I>, BindingError> {
        let err = self.field_not_found(name);
        self.fields
            .iter_mut()
            .find(|b| b.field.name == name)
            .ok_or(err)
    }

    /// Snapshot of every field value, in field order.
    ///
    /// # Errors
    ///
    /// Returns `BindingError::AttributeNotFound` if the instance lacks a
    /// declared field.
    pub fn values(&self) -> Result<Map<String, Value>, BindingError> {
        self.fields
            .iter()
            .map(|b| Ok((b.field.name.clone(), b.value()?)))
            .collect()
    }

    /// Run the instance's validation and record the outcome on each field.
    ///
    /// Every field binding's error list is replaced, so fields that are now
    /// valid are cleared.
    pub fn validate(&mut self) -> ModelValidationResult {
        let errors = self.instance.borrow().validate();

        let mut result = ModelValidationResult::default();
        for error in errors {
            match self.owning_field(&error.path) {
                Some(field) => result
                    .field_errors
                    .entry(field)
                    .or_default()
                    .push(error.message),
                None => result.global_errors.push(error.message),
            }
        }

        for binding in &mut self.fields {
            let messages = result
                .field_errors
                .get(&binding.field.name)
                .cloned()
                .unwrap_or_default();
            binding.set_validation_errors(messages);
        }

        result.is_valid = result.field_errors.is_empty() && result.global_errors.is_empty();
        result
    }

    /// The field a JSON Pointer error path falls under, if any.
    fn owning_field(&self, path: &str) -> Option<String> {
        let token = path.strip_prefix('/')?.split('/').next()?;
        let name = unescape_pointer(token);
        self.fields
            .iter()
            .any(|b| b.field.name == name)
            .then_some(name)
    }

    fn field_not_found(&self, name: &str) -> BindingError {
        BindingError::FieldNotFound {
            field: name.to_string(),
            model: self.model.name.clone(),
        }
    }
}

impl<I: Instance> Index<&str> for ModelBinding<I> {
    type Output = FieldBinding<I>;

    /// # Panics
    ///
    /// Panics with the `FieldNotFound` message if the model has no such field.
    fn index(&self, name: &str) -> &FieldBinding<I> {
        match self.get_field_binding(name) {
            Ok(binding) => binding,
            Err(e) => panic!("{}", e),
        }
    }
}

/// Bind an instance to its introspected model.
///
/// # Errors
///
/// Returns `IntrospectError::UnsupportedModel` if the instance's model
/// cannot be introspected.
pub fn bind_model<I: Instance>(instance: I) -> Result<ModelBinding<I>, IntrospectError> {
    ModelBinding::from_instance(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldDecl, RecordDef, RecordInstance};
    use serde_json::json;
    use std::sync::Arc;

    /// A hand-written instance with a field the instance itself lacks.
    #[derive(Debug)]
    struct Sparse {
        def: Arc<RecordDef>,
        name: Option<String>,
    }

    impl Instance for Sparse {
        type Error = std::fmt::Error;

        fn model_class(&self) -> ModelClass {
            ModelClass::Record(Arc::clone(&self.def))
        }

        fn get_attr(&self, name: &str) -> Option<Value> {
            match name {
                "name" => self.name.clone().map(Value::String),
                _ => None,
            }
        }

        fn set_attr(&mut self, name: &str, value: Value) -> Result<(), std::fmt::Error> {
            match (name, value) {
                ("name", Value::String(s)) => {
                    self.name = Some(s);
                    Ok(())
                }
                _ => Err(std::fmt::Error),
            }
        }

        fn validate(&self) -> Vec<SchemaError> {
            let mut errors = Vec::new();
            if self.name.as_deref() == Some("") {
                errors.push(SchemaError {
                    path: "/name".into(),
                    message: "must not be empty".into(),
                });
            }
            errors.push(SchemaError {
                path: String::new(),
                message: "always suspicious".into(),
            });
            errors
        }
    }

    fn sparse(name: Option<&str>) -> Sparse {
        Sparse {
            def: Arc::new(
                RecordDef::new("Sparse")
                    .field(FieldDecl::new::<String>("name"))
                    .field(FieldDecl::new::<String>("ghost")),
            ),
            name: name.map(String::from),
        }
    }

    fn person() -> RecordInstance {
        let def = RecordDef::new("Person")
            .field(FieldDecl::new::<String>("name"))
            .field(FieldDecl::new::<i64>("age").default_value(30));
        RecordInstance::new(def, json!({ "name": "Ada" })).unwrap()
    }

    #[test]
    fn bindings_mirror_model_fields() {
        let binding = bind_model(person()).unwrap();
        let names: Vec<_> = binding.fields().iter().map(FieldBinding::name).collect();
        assert_eq!(names, binding.model().field_names());
        assert!(binding
            .fields()
            .iter()
            .all(|b| Rc::ptr_eq(b.instance(), binding.instance())));
    }

    #[test]
    fn set_value_round_trips_through_instance() {
        let binding = bind_model(person()).unwrap();
        binding["age"].set_value(json!(41)).unwrap();
        assert_eq!(binding["age"].value().unwrap(), json!(41));
        assert_eq!(binding.instance().borrow().get_attr("age"), Some(json!(41)));
    }

    #[test]
    fn missing_field_is_an_error() {
        let binding = bind_model(person()).unwrap();
        assert!(matches!(
            binding.get_field_binding("nonexistent"),
            Err(BindingError::FieldNotFound { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "field 'nonexistent' not found in model 'Person'")]
    fn index_panics_on_missing_field() {
        let binding = bind_model(person()).unwrap();
        let _ = &binding["nonexistent"];
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let binding = bind_model(sparse(None)).unwrap();
        assert!(matches!(
            binding["ghost"].value(),
            Err(BindingError::AttributeNotFound { .. })
        ));
        assert!(binding.values().is_err());
    }

    #[test]
    fn instance_errors_propagate_unchanged() {
        let binding = bind_model(sparse(Some("x"))).unwrap();
        let result: Result<(), std::fmt::Error> = binding["name"].set_value(json!(5));
        assert_eq!(result, Err(std::fmt::Error));
    }

    #[test]
    fn validation_errors_are_replaced_wholesale() {
        let mut binding = bind_model(person()).unwrap();
        let field = binding.get_field_binding_mut("name").unwrap();
        assert!(field.is_valid());

        field.set_validation_errors(vec!["too short".into(), "bad".into()]);
        assert!(!field.is_valid());
        field.set_validation_errors(vec!["other".into()]);
        assert_eq!(field.validation_errors(), ["other".to_string()]);

        field.set_validation_errors(Vec::new());
        assert!(field.is_valid());
    }

    #[test]
    fn validate_groups_errors_by_field() {
        let mut binding = bind_model(sparse(Some(""))).unwrap();
        let result = binding.validate();
        assert!(!result.is_valid);
        assert_eq!(
            result.field_errors.get("name"),
            Some(&vec!["must not be empty".to_string()])
        );
        assert_eq!(result.global_errors, vec!["always suspicious".to_string()]);
        assert!(!binding["name"].is_valid());
        assert!(binding["ghost"].is_valid());

        binding["name"].set_value(json!("Ada")).unwrap();
        let result = binding.validate();
        assert!(result.field_errors.is_empty());
        assert!(binding["name"].is_valid());
    }

    #[test]
    fn record_instances_validate_clean() {
        let mut binding = bind_model(person()).unwrap();
        let result = binding.validate();
        assert!(result.is_valid);
    }

    #[test]
    fn ui_state_is_per_binding() {
        let mut binding = bind_model(person()).unwrap();
        binding
            .get_field_binding_mut("name")
            .unwrap()
            .ui_state
            .insert("dirty".into(), json!(true));
        binding.ui_state.insert("submitted".into(), json!(false));
        assert_eq!(binding["name"].ui_state.get("dirty"), Some(&json!(true)));
        assert!(binding["age"].ui_state.is_empty());
    }
}
