//! Normalized validation constraints and the extractors that produce them.
//!
//! Constraints are read from two places: JSON Schema keywords on a property
//! subschema, and [`Constraint`] markers attached to a record field
//! declaration. Keywords and markers with no normalized slot are dropped.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// A single constraint marker attached to a record field declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Value must be strictly greater than the bound.
    Gt(f64),
    /// Value must be greater than or equal to the bound.
    Ge(f64),
    /// Value must be strictly less than the bound.
    Lt(f64),
    /// Value must be less than or equal to the bound.
    Le(f64),
    MultipleOf(f64),
    MinLen(u64),
    MaxLen(u64),
    MinItems(u64),
    MaxItems(u64),
    /// Regular expression strings must match.
    Pattern(String),
    /// Closed set of permitted values.
    OneOf(Vec<Value>),
}

/// Validation rules attached to exactly one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constraints {
    /// Lower bound for numeric values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    /// Upper bound for numeric values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// When true the value must be strictly greater than `min_value`.
    pub exclusive_min: bool,
    /// When true the value must be strictly less than `max_value`.
    pub exclusive_max: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    /// Minimum length for strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Maximum length for strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Minimum number of items for arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Maximum number of items for arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Permitted values (enumerations and literals).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
}

impl Constraints {
    /// Returns true if no rule is set.
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    /// Build constraints from record field markers.
    ///
    /// When both an exclusive and an inclusive bound are given for the same
    /// side, the exclusive one wins.
    pub fn from_markers(markers: &[Constraint]) -> Self {
        let mut constraints = Self::default();

        let gt = markers.iter().find_map(|m| match m {
            Constraint::Gt(v) => Some(*v),
            _ => None,
        });
        let ge = markers.iter().find_map(|m| match m {
            Constraint::Ge(v) => Some(*v),
            _ => None,
        });
        let lt = markers.iter().find_map(|m| match m {
            Constraint::Lt(v) => Some(*v),
            _ => None,
        });
        let le = markers.iter().find_map(|m| match m {
            Constraint::Le(v) => Some(*v),
            _ => None,
        });

        if let Some(v) = gt {
            constraints.min_value = Some(v);
            constraints.exclusive_min = true;
        } else if let Some(v) = ge {
            constraints.min_value = Some(v);
        }

        if let Some(v) = lt {
            constraints.max_value = Some(v);
            constraints.exclusive_max = true;
        } else if let Some(v) = le {
            constraints.max_value = Some(v);
        }

        for marker in markers {
            match marker {
                Constraint::MultipleOf(v) => constraints.multiple_of = Some(*v),
                Constraint::MinLen(n) => constraints.min_length = Some(*n),
                Constraint::MaxLen(n) => constraints.max_length = Some(*n),
                Constraint::MinItems(n) => constraints.min_items = Some(*n),
                Constraint::MaxItems(n) => constraints.max_items = Some(*n),
                Constraint::Pattern(p) => constraints.pattern = Some(p.clone()),
                Constraint::OneOf(values) => constraints.allowed_values = Some(values.clone()),
                Constraint::Gt(_) | Constraint::Ge(_) | Constraint::Lt(_) | Constraint::Le(_) => {}
            }
        }

        constraints
    }

    /// Build constraints from the keywords of a property subschema.
    ///
    /// Draft-4 style boolean `exclusiveMinimum`/`exclusiveMaximum` flags are
    /// honoured alongside the numeric form. Keywords holding a value of the
    /// wrong JSON type are dropped.
    pub fn from_json_schema(schema: &Map<String, Value>) -> Self {
        let mut constraints = Self::default();

        constraints.min_value = number(schema, "minimum");
        constraints.max_value = number(schema, "maximum");

        match schema.get("exclusiveMinimum") {
            Some(Value::Bool(flag)) => constraints.exclusive_min = *flag,
            Some(Value::Number(n)) => {
                constraints.min_value = n.as_f64();
                constraints.exclusive_min = true;
            }
            Some(other) => dropped("exclusiveMinimum", other),
            None => {}
        }
        match schema.get("exclusiveMaximum") {
            Some(Value::Bool(flag)) => constraints.exclusive_max = *flag,
            Some(Value::Number(n)) => {
                constraints.max_value = n.as_f64();
                constraints.exclusive_max = true;
            }
            Some(other) => dropped("exclusiveMaximum", other),
            None => {}
        }

        constraints.multiple_of = number(schema, "multipleOf");
        constraints.min_length = count(schema, "minLength");
        constraints.max_length = count(schema, "maxLength");
        constraints.min_items = count(schema, "minItems");
        constraints.max_items = count(schema, "maxItems");
        constraints.pattern = match schema.get("pattern") {
            Some(Value::String(p)) => Some(p.clone()),
            Some(other) => {
                dropped("pattern", other);
                None
            }
            None => None,
        };

        constraints.allowed_values = match (schema.get("enum"), schema.get("const")) {
            (Some(Value::Array(values)), _) => Some(values.clone()),
            (_, Some(value)) => Some(vec![value.clone()]),
            (Some(other), None) => {
                dropped("enum", other);
                None
            }
            (None, None) => None,
        };

        constraints
    }
}

fn number(schema: &Map<String, Value>, key: &str) -> Option<f64> {
    match schema.get(key)? {
        Value::Number(n) => n.as_f64(),
        other => {
            dropped(key, other);
            None
        }
    }
}

fn count(schema: &Map<String, Value>, key: &str) -> Option<u64> {
    match schema.get(key)? {
        Value::Number(n) if n.as_u64().is_some() => n.as_u64(),
        other => {
            dropped(key, other);
            None
        }
    }
}

fn dropped(key: &str, value: &Value) {
    debug!(keyword = key, value = %value, "dropping constraint keyword with unsupported value");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn empty_schema_has_no_constraints() {
        let constraints = Constraints::from_json_schema(&Map::new());
        assert!(constraints.is_empty());
    }

    #[test]
    fn numeric_bounds_from_schema() {
        let constraints = Constraints::from_json_schema(&obj(json!({
            "minimum": 0,
            "exclusiveMaximum": 150,
            "multipleOf": 0.5
        })));
        assert_eq!(constraints.min_value, Some(0.0));
        assert!(!constraints.exclusive_min);
        assert_eq!(constraints.max_value, Some(150.0));
        assert!(constraints.exclusive_max);
        assert_eq!(constraints.multiple_of, Some(0.5));
    }

    #[test]
    fn draft4_boolean_exclusive_flags() {
        let constraints = Constraints::from_json_schema(&obj(json!({
            "minimum": 1,
            "exclusiveMinimum": true
        })));
        assert_eq!(constraints.min_value, Some(1.0));
        assert!(constraints.exclusive_min);
    }

    #[test]
    fn string_and_array_constraints_from_schema() {
        let constraints = Constraints::from_json_schema(&obj(json!({
            "minLength": 2,
            "maxLength": 40,
            "pattern": "^[a-z]+$",
            "minItems": 1,
            "maxItems": 3
        })));
        assert_eq!(constraints.min_length, Some(2));
        assert_eq!(constraints.max_length, Some(40));
        assert_eq!(constraints.pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(constraints.min_items, Some(1));
        assert_eq!(constraints.max_items, Some(3));
    }

    #[test]
    fn enum_and_const_become_allowed_values() {
        let constraints = Constraints::from_json_schema(&obj(json!({
            "enum": ["red", "green"]
        })));
        assert_eq!(
            constraints.allowed_values,
            Some(vec![json!("red"), json!("green")])
        );

        let constraints = Constraints::from_json_schema(&obj(json!({ "const": 7 })));
        assert_eq!(constraints.allowed_values, Some(vec![json!(7)]));
    }

    #[test]
    fn malformed_keywords_are_dropped() {
        let constraints = Constraints::from_json_schema(&obj(json!({
            "minLength": -1,
            "maximum": "ten",
            "pattern": 5,
            "uniqueItems": true
        })));
        assert!(constraints.is_empty());
    }

    #[test]
    fn markers_prefer_exclusive_bounds() {
        let constraints = Constraints::from_markers(&[
            Constraint::Ge(0.0),
            Constraint::Gt(1.0),
            Constraint::Le(10.0),
        ]);
        assert_eq!(constraints.min_value, Some(1.0));
        assert!(constraints.exclusive_min);
        assert_eq!(constraints.max_value, Some(10.0));
        assert!(!constraints.exclusive_max);
    }

    #[test]
    fn markers_fill_length_and_membership() {
        let constraints = Constraints::from_markers(&[
            Constraint::MinLen(3),
            Constraint::MaxLen(8),
            Constraint::MaxItems(4),
            Constraint::Pattern(r"^\w+$".into()),
            Constraint::OneOf(vec![json!("a"), json!("b")]),
        ]);
        assert_eq!(constraints.min_length, Some(3));
        assert_eq!(constraints.max_length, Some(8));
        assert_eq!(constraints.max_items, Some(4));
        assert_eq!(constraints.pattern.as_deref(), Some(r"^\w+$"));
        assert_eq!(constraints.allowed_values.map(|v| v.len()), Some(2));
    }

    #[test]
    fn serializes_only_set_rules() {
        let constraints = Constraints::from_markers(&[Constraint::MinLen(1)]);
        let value = serde_json::to_value(&constraints).unwrap();
        assert_eq!(
            value,
            json!({ "exclusive_min": false, "exclusive_max": false, "min_length": 1 })
        );
    }
}
