//! JSON Schema object documents as models.
//!
//! An object schema with a `properties` member declares one field per
//! property, in document order. Side-channel annotations are plain property
//! keywords (`"field_type": "email"`); keywords JSON Schema does not define
//! and that have no normalized slot end up in the field metadata.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::adapter::{FieldAdapter, ModelAdapter, ModelClass};
use crate::binding::Instance;
use crate::constraints::Constraints;
use crate::error::{AssignError, InstanceError, IntrospectError, SchemaError};
use crate::types::{json_type_name, FIELD_SCHEMA_KEYWORDS, MODEL_SCHEMA_KEYWORDS};
use crate::validator::{check_schema, escape_pointer, validate_document};

/// Name used when a schema has neither `title` nor `$id`.
pub const DEFAULT_MODEL_NAME: &str = "Model";

pub(crate) struct SchemaAdapter<'a> {
    root: &'a Map<String, Value>,
    properties: &'a Map<String, Value>,
    required: Vec<&'a str>,
}

impl<'a> SchemaAdapter<'a> {
    /// Accept `schema` only if it declares object properties.
    pub(crate) fn detect(schema: &'a Value) -> Result<Self, IntrospectError> {
        let Value::Object(root) = schema else {
            return Err(IntrospectError::UnsupportedModel {
                reason: format!("expected a JSON Schema object, got {}", json_type_name(schema)),
            });
        };
        let Some(Value::Object(properties)) = root.get("properties") else {
            return Err(IntrospectError::UnsupportedModel {
                reason: format!(
                    "schema '{}' declares no object properties",
                    model_name(root)
                ),
            });
        };

        let required = root
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        Ok(Self {
            root,
            properties,
            required,
        })
    }
}

impl ModelAdapter for SchemaAdapter<'_> {
    fn name(&self) -> String {
        model_name(self.root)
    }

    fn title(&self) -> Option<String> {
        string(self.root, "title")
    }

    fn description(&self) -> Option<String> {
        string(self.root, "description")
    }

    fn frozen(&self) -> bool {
        is_frozen(self.root)
    }

    fn metadata(&self) -> Map<String, Value> {
        self.root
            .iter()
            .filter(|(k, _)| !MODEL_SCHEMA_KEYWORDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn fields(&self) -> Vec<Box<dyn FieldAdapter + '_>> {
        self.properties
            .iter()
            .map(|(name, prop)| {
                Box::new(SchemaFieldAdapter {
                    name,
                    prop: prop.as_object(),
                    required: self.required.contains(&name.as_str()),
                }) as Box<dyn FieldAdapter + '_>
            })
            .collect()
    }
}

struct SchemaFieldAdapter<'a> {
    name: &'a str,
    /// `None` for boolean subschemas (`"field": true`).
    prop: Option<&'a Map<String, Value>>,
    required: bool,
}

impl SchemaFieldAdapter<'_> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.prop.and_then(|p| p.get(key))
    }
}

impl FieldAdapter for SchemaFieldAdapter<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn raw_type(&self) -> String {
        self.prop.map(type_name).unwrap_or_else(|| "any".to_string())
    }

    fn title(&self) -> Option<String> {
        self.prop.and_then(|p| string(p, "title"))
    }

    fn description(&self) -> Option<String> {
        self.prop.and_then(|p| string(p, "description"))
    }

    fn annotations(&self) -> Map<String, Value> {
        self.prop
            .map(|p| {
                p.iter()
                    .filter(|(k, _)| !FIELD_SCHEMA_KEYWORDS.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn default(&self) -> Option<Value> {
        match self.get("default") {
            Some(value) => Some(value.clone()),
            // an absent optional member reads as null
            None if !self.required => Some(Value::Null),
            None => None,
        }
    }

    fn constraints(&self) -> Constraints {
        self.prop
            .map(Constraints::from_json_schema)
            .unwrap_or_default()
    }

    /// Either spelling marks the field read-only, matching what
    /// `SchemaInstance` enforces on assignment.
    fn readonly(&self) -> Option<bool> {
        let standard = self.get("readOnly").and_then(Value::as_bool);
        let annotated = self.get("readonly").and_then(Value::as_bool);
        match (standard, annotated) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(false) || b.unwrap_or(false)),
        }
    }
}

/// Model name: `title`, else the file stem of `$id`, else [`DEFAULT_MODEL_NAME`].
fn model_name(root: &Map<String, Value>) -> String {
    if let Some(title) = string(root, "title") {
        return title;
    }
    root.get("$id")
        .and_then(Value::as_str)
        .and_then(|id| id.trim_end_matches('/').rsplit('/').next())
        .and_then(|file| file.split('.').next())
        .filter(|stem| !stem.is_empty())
        .map(String::from)
        .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string())
}

fn is_frozen(root: &Map<String, Value>) -> bool {
    flag(root, "frozen") || flag(root, "readOnly")
}

fn flag(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(String::from)
}

/// Type name of a property subschema.
///
/// `{"type": "array", "items": {"type": "string"}}` is `array<string>`,
/// unions (type arrays, `anyOf`, `oneOf`) are joined with ` | `, and `$ref`
/// targets are named by their last pointer segment.
fn type_name(prop: &Map<String, Value>) -> String {
    if let Some(reference) = prop.get("$ref").and_then(Value::as_str) {
        return reference
            .rsplit('/')
            .next()
            .unwrap_or(reference)
            .to_string();
    }

    match prop.get("type") {
        Some(Value::String(t)) if t == "array" => match prop.get("items") {
            Some(Value::Object(items)) => format!("array<{}>", type_name(items)),
            _ => "array".to_string(),
        },
        Some(Value::String(t)) => t.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" | "),
        _ => {
            let variants = prop
                .get("anyOf")
                .or_else(|| prop.get("oneOf"))
                .and_then(Value::as_array);
            match variants {
                Some(variants) => variants
                    .iter()
                    .map(|v| v.as_object().map(type_name).unwrap_or_else(|| "any".into()))
                    .collect::<Vec<_>>()
                    .join(" | "),
                None if prop.contains_key("enum") || prop.contains_key("const") => {
                    "enum".to_string()
                }
                None => "any".to_string(),
            }
        }
    }
}

/// A JSON object document bound to the schema that describes it.
///
/// Assignments are checked by `jsonschema` before they land: the candidate
/// document is validated and any error located at or under the assigned
/// property rejects the assignment.
#[derive(Debug, Clone)]
pub struct SchemaInstance {
    schema: Arc<Value>,
    data: Map<String, Value>,
}

impl SchemaInstance {
    /// Bind `data` to `schema`, filling declared defaults for absent members.
    ///
    /// The document itself is not validated here; see
    /// [`ModelBinding::validate`](crate::ModelBinding::validate).
    ///
    /// # Errors
    ///
    /// Returns `InstanceError` if the schema is unsupported or does not
    /// compile, or if `data` is not a JSON object.
    pub fn new(schema: impl Into<Arc<Value>>, data: Value) -> Result<Self, InstanceError> {
        let schema = schema.into();
        let mut data = match data {
            Value::Object(map) => map,
            other => {
                return Err(InstanceError::NotAnObject {
                    actual: json_type_name(&other).to_string(),
                })
            }
        };

        {
            let adapter = SchemaAdapter::detect(&schema)?;
            check_schema(&schema)?;
            for (name, prop) in adapter.properties {
                if data.contains_key(name) {
                    continue;
                }
                if let Some(default) = prop.get("default") {
                    data.insert(name.clone(), default.clone());
                }
            }
        }

        Ok(Self { schema, data })
    }

    pub fn schema(&self) -> &Arc<Value> {
        &self.schema
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }

    fn root(&self) -> Option<&Map<String, Value>> {
        self.schema.as_object()
    }

    fn property(&self, name: &str) -> Option<&Value> {
        self.root()?.get("properties")?.as_object()?.get(name)
    }
}

impl Instance for SchemaInstance {
    type Error = AssignError;

    fn model_class(&self) -> ModelClass {
        ModelClass::Schema(Arc::clone(&self.schema))
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        match self.data.get(name) {
            Some(value) => Some(value.clone()),
            None => self.property(name).map(|_| Value::Null),
        }
    }

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), AssignError> {
        let model = self.root().map(model_name).unwrap_or_default();

        if self.root().is_some_and(is_frozen) {
            return Err(AssignError::Frozen {
                model,
                field: name.to_string(),
            });
        }

        match self.property(name) {
            Some(Value::Object(prop)) => {
                if flag(prop, "readOnly") || flag(prop, "readonly") {
                    return Err(AssignError::ReadOnly {
                        field: name.to_string(),
                    });
                }
            }
            Some(_) => {}
            None => {
                let closed = self
                    .root()
                    .and_then(|r| r.get("additionalProperties"))
                    .is_some_and(|v| v == &Value::Bool(false));
                if closed {
                    return Err(AssignError::UnknownAttribute {
                        model,
                        field: name.to_string(),
                    });
                }
            }
        }

        let mut candidate = self.data.clone();
        candidate.insert(name.to_string(), value.clone());
        let errors = validate_document(&self.schema, &Value::Object(candidate)).map_err(|e| {
            AssignError::Invalid {
                field: name.to_string(),
                errors: vec![SchemaError {
                    path: String::new(),
                    message: e.to_string(),
                }],
            }
        })?;

        let prefix = format!("/{}", escape_pointer(name));
        let nested = format!("{}/", prefix);
        let relevant: Vec<SchemaError> = errors
            .into_iter()
            .filter(|e| e.path == prefix || e.path.starts_with(&nested))
            .map(|e| SchemaError {
                path: e.path[prefix.len()..].to_string(),
                message: e.message,
            })
            .collect();

        if !relevant.is_empty() {
            return Err(AssignError::Invalid {
                field: name.to_string(),
                errors: relevant,
            });
        }

        trace!(model = %model, field = name, "assigning schema attribute");
        self.data.insert(name.to_string(), value);
        Ok(())
    }

    fn validate(&self) -> Vec<SchemaError> {
        let document = Value::Object(self.data.clone());
        validate_document(&self.schema, &document).unwrap_or_else(|e| {
            vec![SchemaError {
                path: String::new(),
                message: e.to_string(),
            }]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> Value {
        json!({
            "title": "User",
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "age": { "type": "integer", "minimum": 0, "default": 30 },
                "id": { "type": "string", "readOnly": true }
            },
            "required": ["name"]
        })
    }

    #[test]
    fn detect_rejects_non_object_schemas() {
        let scalar = json!({ "type": "string" });
        assert!(matches!(
            SchemaAdapter::detect(&scalar),
            Err(IntrospectError::UnsupportedModel { .. })
        ));
        assert!(SchemaAdapter::detect(&json!([1, 2])).is_err());
        assert!(SchemaAdapter::detect(&json!({ "properties": [] })).is_err());
    }

    #[test]
    fn model_name_fallbacks() {
        let root = json!({ "$id": "https://example.com/schemas/order.json" });
        assert_eq!(model_name(root.as_object().unwrap()), "order");
        let root = json!({});
        assert_eq!(model_name(root.as_object().unwrap()), DEFAULT_MODEL_NAME);
    }

    #[test]
    fn type_names() {
        let cases = [
            (json!({ "type": "string" }), "string"),
            (json!({ "type": "array", "items": { "type": "integer" } }), "array<integer>"),
            (json!({ "type": ["string", "null"] }), "string | null"),
            (
                json!({ "anyOf": [{ "type": "string" }, { "type": "null" }] }),
                "string | null",
            ),
            (json!({ "$ref": "#/$defs/Address" }), "Address"),
            (json!({ "enum": ["a", "b"] }), "enum"),
            (json!({}), "any"),
        ];
        for (prop, expected) in cases {
            assert_eq!(type_name(prop.as_object().unwrap()), expected);
        }
    }

    #[test]
    fn instance_fills_declared_defaults() {
        let instance = SchemaInstance::new(user_schema(), json!({ "name": "Ada" })).unwrap();
        assert_eq!(instance.get_attr("age"), Some(json!(30)));
        assert_eq!(instance.get_attr("id"), Some(Value::Null));
        assert_eq!(instance.get_attr("nope"), None);
    }

    #[test]
    fn instance_requires_object_data() {
        let result = SchemaInstance::new(user_schema(), json!("Ada"));
        assert!(matches!(result, Err(InstanceError::NotAnObject { .. })));
    }

    #[test]
    fn assignment_is_validated() {
        let mut instance = SchemaInstance::new(user_schema(), json!({ "name": "Ada" })).unwrap();

        instance.set_attr("age", json!(41)).unwrap();
        assert_eq!(instance.get_attr("age"), Some(json!(41)));

        let result = instance.set_attr("age", json!(-1));
        assert!(matches!(result, Err(AssignError::Invalid { ref field, .. }) if field == "age"));
        assert_eq!(instance.get_attr("age"), Some(json!(41)));
    }

    #[test]
    fn assignment_ignores_errors_on_other_fields() {
        let mut instance = SchemaInstance::new(user_schema(), json!({ "name": 5 })).unwrap();
        instance.set_attr("age", json!(2)).unwrap();
        assert_eq!(instance.get_attr("age"), Some(json!(2)));
    }

    #[test]
    fn read_only_and_frozen_reject_assignment() {
        let mut instance = SchemaInstance::new(user_schema(), json!({ "name": "Ada" })).unwrap();
        let result = instance.set_attr("id", json!("u-1"));
        assert!(matches!(result, Err(AssignError::ReadOnly { .. })));

        let mut schema = user_schema();
        schema["frozen"] = json!(true);
        let mut instance = SchemaInstance::new(schema, json!({ "name": "Ada" })).unwrap();
        let result = instance.set_attr("name", json!("Grace"));
        assert!(matches!(result, Err(AssignError::Frozen { ref model, .. }) if model == "User"));
    }

    #[test]
    fn read_only_spellings_agree_with_enforcement() {
        let schema = json!({
            "type": "object",
            "properties": {
                "a": { "type": "string", "readOnly": false, "readonly": true },
                "b": { "type": "string", "readOnly": true, "readonly": false },
                "c": { "type": "string", "readOnly": false }
            }
        });
        let fields = crate::field::get_fields(&ModelClass::from(schema.clone())).unwrap();
        let flags: Vec<_> = fields.iter().map(|f| f.readonly).collect();
        assert_eq!(flags, vec![true, true, false]);

        let mut instance = SchemaInstance::new(schema, json!({})).unwrap();
        for field in &fields {
            let result = instance.set_attr(&field.name, json!("x"));
            assert_eq!(
                matches!(result, Err(AssignError::ReadOnly { .. })),
                field.readonly,
                "{}",
                field.name
            );
        }
    }

    #[test]
    fn closed_schema_rejects_unknown_attributes() {
        let mut schema = user_schema();
        schema["additionalProperties"] = json!(false);
        let mut instance = SchemaInstance::new(schema, json!({ "name": "Ada" })).unwrap();
        let result = instance.set_attr("nickname", json!("A"));
        assert!(matches!(result, Err(AssignError::UnknownAttribute { .. })));

        let mut open = SchemaInstance::new(user_schema(), json!({ "name": "Ada" })).unwrap();
        open.set_attr("nickname", json!("A")).unwrap();
        assert_eq!(open.get_attr("nickname"), Some(json!("A")));
    }

    #[test]
    fn validate_reports_document_errors() {
        let instance = SchemaInstance::new(user_schema(), json!({ "age": "old" })).unwrap();
        let mut paths: Vec<_> = instance.validate().into_iter().map(|e| e.path).collect();
        paths.sort();
        assert_eq!(paths, vec!["/age", "/name"]);
    }
}
