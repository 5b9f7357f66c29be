//! Normalized field metadata.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::adapter::{FieldAdapter, ModelClass};
use crate::constraints::Constraints;
use crate::error::IntrospectError;
use crate::record::short_type_name;
use crate::types::{humanize, ANNOTATION_KEYS};

/// One declared field of a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PyField {
    /// Field name, unique within its model.
    pub name: String,
    /// Type as declared: a Rust type name for records, a JSON Schema type
    /// expression for schemas.
    pub raw_type: String,
    /// Name of the model declaring this field.
    pub parent_model: String,
    /// Custom field-type tag from the `field_type` annotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Value>>,
    pub hidden: bool,
    pub readonly: bool,
    pub deprecated: bool,
    pub is_required: bool,
    /// Resolved default; `None` when the field has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub constraints: Constraints,
    /// Annotations without a dedicated slot.
    pub metadata: Map<String, Value>,
}

impl PyField {
    pub(crate) fn from_adapter(adapter: &dyn FieldAdapter, parent_model: &str) -> Self {
        let name = adapter.name().to_string();
        let annotations = adapter.annotations();

        let annotated_flag = |key: &str| annotations.get(key).and_then(Value::as_bool);
        let hidden = adapter.hidden().or_else(|| annotated_flag("hidden"));
        let readonly = adapter.readonly().or_else(|| annotated_flag("readonly"));
        let deprecated = adapter.deprecated().or_else(|| annotated_flag("deprecated"));

        let examples = adapter.examples().or_else(|| match annotations.get("examples") {
            Some(Value::Array(values)) => Some(values.clone()),
            _ => None,
        });
        let placeholder = match annotations.get("placeholder") {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Null) | None => examples
                .as_ref()
                .and_then(|e| e.first())
                .filter(|first| !first.is_null())
                .map(display_value),
            Some(other) => Some(display_value(other)),
        };

        let field_type = annotations
            .get("field_type")
            .and_then(Value::as_str)
            .map(String::from);

        let default = adapter.default();
        let metadata = annotations
            .into_iter()
            .filter(|(k, _)| !ANNOTATION_KEYS.contains(&k.as_str()))
            .collect();

        Self {
            title: adapter.title().unwrap_or_else(|| humanize(&name)),
            raw_type: adapter.raw_type(),
            parent_model: parent_model.to_string(),
            field_type,
            description: adapter.description(),
            placeholder,
            examples,
            hidden: hidden.unwrap_or(false),
            readonly: readonly.unwrap_or(false),
            deprecated: deprecated.unwrap_or(false),
            is_required: default.is_none(),
            default,
            constraints: adapter.constraints(),
            metadata,
            name,
        }
    }

    /// Returns true if the field has a default value.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Check the declared type by name.
    ///
    /// Matches the full type (`Vec<String>`) or its generic origin (`Vec`).
    pub fn is_of_type(&self, type_name: &str) -> bool {
        self.raw_type == type_name || type_origin(&self.raw_type) == type_name
    }

    /// Check the declared type against a Rust type.
    pub fn is_type<T: ?Sized>(&self) -> bool {
        self.is_of_type(&short_type_name(std::any::type_name::<T>()))
    }

    /// A sensible starting value for a form input.
    ///
    /// Uses the default if present, then the first example, then the first
    /// allowed value, and finally a value derived from the type that honours
    /// minimum length and positive minimum bounds.
    pub fn initial_value(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        if let Some(example) = self.examples.as_ref().and_then(|e| e.first()) {
            return example.clone();
        }
        if let Some(allowed) = self
            .constraints
            .allowed_values
            .as_ref()
            .and_then(|v| v.first())
        {
            return allowed.clone();
        }
        self.value_for_type(&self.raw_type)
    }

    fn value_for_type(&self, raw_type: &str) -> Value {
        // unions, nullable or not, start from the first non-null member
        if raw_type.contains('|') {
            return raw_type
                .split('|')
                .map(str::trim)
                .find(|member| *member != "null")
                .map(|member| self.value_for_type(member))
                .unwrap_or(Value::Null);
        }
        if type_origin(raw_type) == "Option" {
            return match generic_argument(raw_type) {
                Some(inner) => self.value_for_type(inner),
                None => Value::Null,
            };
        }

        let positive_min = self.constraints.min_value.filter(|min| *min > 0.0);
        match type_origin(raw_type) {
            "String" | "str" | "&str" | "string" | "char" => {
                let len = self
                    .constraints
                    .min_length
                    .and_then(|n| usize::try_from(n).ok())
                    .filter(|n| *n <= MAX_INITIAL_PADDING)
                    .unwrap_or(0);
                Value::String(" ".repeat(len))
            }
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize" | "integer" => Value::from(positive_min.map_or(0, |min| min as i64)),
            "f32" | "f64" | "number" => Value::from(positive_min.unwrap_or(0.0)),
            "bool" | "boolean" => Value::Bool(false),
            "Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "array" => Value::Array(Vec::new()),
            "HashMap" | "BTreeMap" | "Map" | "object" => Value::Object(Map::new()),
            _ if raw_type.starts_with('[') => Value::Array(Vec::new()),
            _ => Value::Null,
        }
    }
}

/// Longest string `initial_value` pads up to `min_length`; longer minimums
/// start empty.
const MAX_INITIAL_PADDING: usize = 4096;

/// Generic origin of a type expression: `Vec<String>` is `Vec`.
fn type_origin(raw_type: &str) -> &str {
    raw_type.split('<').next().unwrap_or(raw_type).trim()
}

/// Text between the outermost angle brackets: `Option<Vec<i64>>` gives `Vec<i64>`.
fn generic_argument(raw_type: &str) -> Option<&str> {
    let start = raw_type.find('<')?;
    let end = raw_type.rfind('>')?;
    (start < end).then(|| raw_type[start + 1..end].trim())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Introspect the fields a model declares, in declaration order.
///
/// # Errors
///
/// Returns `IntrospectError::UnsupportedModel` if the model does not expose
/// field declarations.
pub fn get_fields(model: &ModelClass) -> Result<Vec<PyField>, IntrospectError> {
    let adapter = model.adapter()?;
    let parent = adapter.name();
    let fields: Vec<PyField> = adapter
        .fields()
        .iter()
        .map(|f| PyField::from_adapter(f.as_ref(), &parent))
        .collect();
    debug!(model = %parent, kind = ?model.kind(), fields = fields.len(), "introspected fields");
    Ok(fields)
}
