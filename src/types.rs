//! Core types and constants shared by the model adapters.

use serde::Serialize;
use serde_json::Value;

/// Side-channel annotation keys with first-class slots on a field.
pub const ANNOTATION_KEYS: &[&str] = &[
    "field_type",
    "hidden",
    "readonly",
    "deprecated",
    "placeholder",
    "examples",
];

/// Standard JSON Schema keywords on a property subschema (never copied to
/// field metadata).
///
/// Covers the 2020-12 core, applicator, unevaluated, validation, format and
/// content vocabularies plus draft-7 spellings. `deprecated` and `examples`
/// are read as annotations instead, and `writeOnly` is left to metadata.
pub const FIELD_SCHEMA_KEYWORDS: &[&str] = &[
    // core
    "$id",
    "$schema",
    "$ref",
    "$anchor",
    "$dynamicRef",
    "$dynamicAnchor",
    "$recursiveRef",
    "$recursiveAnchor",
    "$vocabulary",
    "$comment",
    "$defs",
    "definitions",
    // applicator
    "prefixItems",
    "items",
    "additionalItems",
    "contains",
    "properties",
    "patternProperties",
    "additionalProperties",
    "propertyNames",
    "dependentSchemas",
    "dependencies",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "if",
    "then",
    "else",
    "unevaluatedItems",
    "unevaluatedProperties",
    // validation
    "type",
    "enum",
    "const",
    "multipleOf",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "maxItems",
    "minItems",
    "uniqueItems",
    "maxContains",
    "minContains",
    "maxProperties",
    "minProperties",
    "required",
    "dependentRequired",
    // meta-data
    "title",
    "description",
    "default",
    "readOnly",
    // format and content
    "format",
    "contentEncoding",
    "contentMediaType",
    "contentSchema",
];

/// JSON Schema keywords consumed at model level (never copied to metadata).
pub const MODEL_SCHEMA_KEYWORDS: &[&str] = &[
    "title",
    "description",
    "type",
    "properties",
    "required",
    "frozen",
    "readOnly",
];

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The declaration kind a model was introspected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// A Rust-declared structured record.
    Record,
    /// A JSON Schema object document.
    Schema,
}

/// Turn an identifier into a display label.
///
/// Splits on underscores, dashes and lower-to-upper case boundaries, then
/// capitalizes only the first word: `first_name` and `firstName` both become
/// `First name`.
pub fn humanize(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in name.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    let joined = words.join(" ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
