//! Normalized model metadata.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::adapter::ModelClass;
use crate::error::IntrospectError;
use crate::field::PyField;
use crate::types::{humanize, ModelKind};

/// Metadata describing one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PyModel {
    pub name: String,
    pub kind: ModelKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether instances reject assignment.
    pub frozen: bool,
    /// Fields in declaration order.
    pub fields: Vec<PyField>,
    pub metadata: Map<String, Value>,
}

/// Filters for [`PyModel::get_fields`].
///
/// Every set filter must match by equality; unset filters match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
    pub required: Option<bool>,
    pub hidden: Option<bool>,
    pub readonly: Option<bool>,
    pub deprecated: Option<bool>,
    pub field_type: Option<String>,
}

impl FieldFilter {
    /// A filter matching every field.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = Some(readonly);
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Some(deprecated);
        self
    }

    pub fn field_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    /// Returns true if no filter is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, field: &PyField) -> bool {
        self.required.map_or(true, |v| field.is_required == v)
            && self.hidden.map_or(true, |v| field.hidden == v)
            && self.readonly.map_or(true, |v| field.readonly == v)
            && self.deprecated.map_or(true, |v| field.deprecated == v)
            && self
                .field_type
                .as_ref()
                .map_or(true, |v| field.field_type.as_ref() == Some(v))
    }
}

impl PyModel {
    /// Fields matching `filter`, in declaration order.
    pub fn get_fields(&self, filter: &FieldFilter) -> Vec<&PyField> {
        self.fields.iter().filter(|f| filter.matches(f)).collect()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&PyField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Introspect a model.
///
/// # Errors
///
/// Returns `IntrospectError::UnsupportedModel` if the model does not expose
/// field declarations.
pub fn get_model(model: &ModelClass) -> Result<PyModel, IntrospectError> {
    let adapter = model.adapter()?;
    let name = adapter.name();
    let fields = crate::field::get_fields(model)?;

    debug!(model = %name, kind = ?model.kind(), "introspected model");

    Ok(PyModel {
        title: adapter.title().unwrap_or_else(|| humanize(&name)),
        kind: model.kind(),
        description: adapter.description(),
        frozen: adapter.frozen(),
        fields,
        metadata: adapter.metadata(),
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldDecl, RecordDef};
    use serde_json::json;

    fn profile() -> ModelClass {
        RecordDef::new("UserProfile")
            .doc("Profile shown on the account page.")
            .metadata("icon", "user")
            .field(FieldDecl::new::<String>("name"))
            .field(
                FieldDecl::new::<String>("email")
                    .annotated(json!({ "field_type": "email" })),
            )
            .field(
                FieldDecl::new::<String>("token")
                    .default_value("")
                    .annotated(json!({ "hidden": true, "readonly": true })),
            )
            .field(
                FieldDecl::new::<i64>("legacy_id")
                    .default_value(0)
                    .annotated(json!({ "deprecated": true })),
            )
            .into()
    }

    #[test]
    fn model_level_metadata() {
        let model = get_model(&profile()).unwrap();
        assert_eq!(model.name, "UserProfile");
        assert_eq!(model.kind, ModelKind::Record);
        assert_eq!(model.title, "User profile");
        assert_eq!(
            model.description.as_deref(),
            Some("Profile shown on the account page.")
        );
        assert!(!model.frozen);
        assert_eq!(Value::Object(model.metadata), json!({ "icon": "user" }));
    }

    #[test]
    fn explicit_title_metadata_is_not_duplicated() {
        let class: ModelClass = RecordDef::new("Cfg")
            .metadata("title", "Configuration")
            .field(FieldDecl::new::<bool>("debug").default_value(false))
            .into();
        let model = get_model(&class).unwrap();
        assert_eq!(model.title, "Configuration");
        assert!(model.metadata.is_empty());
    }

    #[test]
    fn unfiltered_returns_all_fields_in_order() {
        let model = get_model(&profile()).unwrap();
        let all: Vec<&PyField> = model.fields.iter().collect();
        assert_eq!(model.get_fields(&FieldFilter::new()), all);
        assert_eq!(
            model.field_names(),
            vec!["name", "email", "token", "legacy_id"]
        );
    }

    #[test]
    fn required_filter_partitions_fields() {
        let model = get_model(&profile()).unwrap();
        let required = model.get_fields(&FieldFilter::new().required(true));
        let optional = model.get_fields(&FieldFilter::new().required(false));
        let names = |fields: &[&PyField]| fields.iter().map(|f| f.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&required), vec!["name", "email"]);
        assert_eq!(names(&optional), vec!["token", "legacy_id"]);
        assert_eq!(required.len() + optional.len(), model.fields.len());
    }

    #[test]
    fn combined_filters() {
        let model = get_model(&profile()).unwrap();
        let visible_editable = model.get_fields(&FieldFilter::new().hidden(false).readonly(false));
        assert_eq!(visible_editable.len(), 3);

        let emails = model.get_fields(&FieldFilter::new().field_type("email"));
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].name, "email");

        let deprecated = model.get_fields(&FieldFilter::new().deprecated(true));
        assert_eq!(deprecated[0].name, "legacy_id");

        let impossible = model.get_fields(&FieldFilter::new().required(true).hidden(true));
        assert!(impossible.is_empty());
    }

    #[test]
    fn field_lookup() {
        let model = get_model(&profile()).unwrap();
        assert_eq!(model.field("email").map(|f| f.parent_model.as_str()), Some("UserProfile"));
        assert!(model.field("missing").is_none());
    }

    #[test]
    fn filter_is_empty() {
        assert!(FieldFilter::new().is_empty());
        assert!(!FieldFilter::new().hidden(false).is_empty());
    }
}
