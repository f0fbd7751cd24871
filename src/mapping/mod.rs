//! The exchange with the language model: what is sent, what comes back.
//!
//! A [`MappingRequest`] packages the captured form structure with the user's
//! instructions. The model answers with a [`MappingResponse`], a list of
//! [`MappedField`]s the injector writes into the page. The call itself sits
//! behind the [`FieldMapper`] trait.

pub mod client;
pub mod sanitizer;

pub use client::{CannedMapper, FieldMapper, MapperConfig, OpenAiMapper};
pub use sanitizer::{parse_mapping_response, MarkdownJsonSanitizer, PassthroughSanitizer, ResponseSanitizer};

use crate::dom::element::ElementRecord;
use crate::dom::fields::FieldDescriptor;
use crate::dom::tree::PageSnapshot;
use crate::error::{AutofillError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-field state reported by the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    /// A value was found for the field
    #[default]
    Filled,
    /// The field needs more input from the user
    Waiting,
    /// The model could not decide on the field
    Error,
}

/// Overall state of a mapping response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MappingStatus {
    Pending,
    Partial,
    #[default]
    Completed,
    Error,
}

/// One instruction from the model: which element, and what to put in it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MappedField {
    /// Input type or tag of the target (`text`, `email`, `checkbox`, `select`, `button`, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Value to write; strings, numbers and booleans are accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Desired state of a checkbox
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,

    #[serde(default)]
    pub status: FieldStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,

    /// Tag of the target element, echoed from the captured structure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,

    /// Raw attributes echoed from a flat field listing
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl MappedField {
    /// Create a new MappedField for a target of the given type
    pub fn new(field_type: impl Into<String>) -> Self {
        Self {
            field_type: Some(field_type.into()),
            ..Default::default()
        }
    }

    /// Builder method: set id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method: set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder method: set label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builder method: set placeholder
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Builder method: set tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builder method: set aria-label
    pub fn with_aria_label(mut self, aria_label: impl Into<String>) -> Self {
        self.aria_label = Some(aria_label.into());
        self
    }

    /// Builder method: set value
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Builder method: set checked
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Builder method: set status
    pub fn with_status(mut self, status: FieldStatus) -> Self {
        self.status = status;
        self
    }

    /// `Field (Type: .., Name: .., ID: .., Label: ..)` with `N/A` for blanks
    pub fn identifier(&self) -> String {
        fn or_na(value: &Option<String>) -> &str {
            value.as_deref().filter(|v| !v.is_empty()).unwrap_or("N/A")
        }
        format!(
            "Field (Type: {}, Name: {}, ID: {}, Label: {})",
            or_na(&self.field_type),
            or_na(&self.name),
            or_na(&self.id),
            or_na(&self.label)
        )
    }

    /// The value as text: strings as-is, numbers and booleans formatted,
    /// `None` for null or missing
    pub fn value_text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// `aria-label` from the field or from its echoed attributes
    pub fn aria_label(&self) -> Option<&str> {
        self.aria_label
            .as_deref()
            .or_else(|| self.attributes.get("aria-label").and_then(Value::as_str))
            .filter(|label| !label.is_empty())
    }
}

/// What the model sends back
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MappingResponse {
    #[serde(default)]
    pub status: MappingStatus,

    #[serde(alias = "formStructure")]
    pub fields: Vec<MappedField>,
}

impl MappingResponse {
    pub fn new(status: MappingStatus, fields: Vec<MappedField>) -> Self {
        Self { status, fields }
    }

    /// Fields the model marked as needing more input
    pub fn waiting(&self) -> impl Iterator<Item = &MappedField> {
        self.fields.iter().filter(|f| f.status == FieldStatus::Waiting)
    }
}

/// Captured structure in either of its two shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormPayload {
    Tree(Vec<ElementRecord>),
    Flat(Vec<FieldDescriptor>),
}

impl FormPayload {
    pub fn len(&self) -> usize {
        match self {
            FormPayload::Tree(records) => records.len(),
            FormPayload::Flat(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStructurePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub form_structure: FormPayload,
}

/// What is sent to the model: `{ pageStructure: { formStructure }, userInput }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRequest {
    pub page_structure: PageStructurePayload,
    pub user_input: String,
}

const TASK: &str = "Fill out the form described by formStructure using the information in userInput.";

const INSTRUCTIONS: &str = "Respond with a single JSON object matching responseSchema. \
Add one entry to `fields` for every control you can fill, copying its `type`, `id`, `name`, `label`, `placeholder` and `tag` from formStructure so it can be found again. \
Put the value in `value`; for checkboxes use `checked`; for selects and radios use the option `value`, never its text. \
Set `status` to `waiting` when the user still has to supply the information and to `error` when the field cannot be filled. \
Use `{\"type\": \"button\", \"value\": \"click\"}` to press a button. Do not wrap the JSON in markdown.";

impl MappingRequest {
    /// Build a request from a structural snapshot
    pub fn from_snapshot(snapshot: &PageSnapshot, user_input: impl Into<String>) -> Result<Self> {
        let request = Self {
            page_structure: PageStructurePayload {
                url: Some(snapshot.url.clone()),
                title: snapshot.title.clone(),
                form_structure: FormPayload::Tree(snapshot.form_structure.clone()),
            },
            user_input: user_input.into(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Build a request from a flat field listing
    pub fn from_fields(fields: Vec<FieldDescriptor>, user_input: impl Into<String>) -> Result<Self> {
        let request = Self {
            page_structure: PageStructurePayload {
                url: None,
                title: None,
                form_structure: FormPayload::Flat(fields),
            },
            user_input: user_input.into(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Reject requests with no instructions or nothing to fill
    pub fn validate(&self) -> Result<()> {
        if self.user_input.trim().is_empty() {
            return Err(AutofillError::InvalidRequest("userInput is required".to_string()));
        }
        if self.page_structure.form_structure.is_empty() {
            return Err(AutofillError::InvalidRequest(
                "pageStructure must contain a non-empty formStructure array".to_string(),
            ));
        }
        Ok(())
    }

    /// User message for a chat model: the structure, the instructions and the
    /// JSON schema the answer must follow
    pub fn to_prompt(&self) -> Result<String> {
        let schema = serde_json::to_value(schemars::schema_for!(MappingResponse))
            .map_err(|e| AutofillError::InvalidRequest(format!("Failed to build response schema: {}", e)))?;
        let prompt = serde_json::json!({
            "task": TASK,
            "userInput": self.user_input,
            "formStructure": self.page_structure.form_structure,
            "instructions": INSTRUCTIONS,
            "responseSchema": schema,
        });
        serde_json::to_string(&prompt)
            .map_err(|e| AutofillError::InvalidRequest(format!("Failed to serialize request: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::element::{BaseAttributes, ElementKind, InputFields};
    use serde_json::json;

    fn snapshot() -> PageSnapshot {
        PageSnapshot {
            url: "https://example.com".to_string(),
            title: Some("Example".to_string()),
            timestamp: "0".to_string(),
            form_structure: vec![ElementRecord::new(
                "input",
                BaseAttributes {
                    id: Some("email".to_string()),
                    ..Default::default()
                },
                ElementKind::Input(InputFields {
                    input_type: "email".to_string(),
                    ..Default::default()
                }),
            )],
        }
    }

    #[test]
    fn test_request_shape() {
        let request = MappingRequest::from_snapshot(&snapshot(), "my email is a@b.com").unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["userInput"], "my email is a@b.com");
        assert_eq!(value["pageStructure"]["formStructure"][0]["id"], "email");
        assert_eq!(value["pageStructure"]["url"], "https://example.com");
    }

    #[test]
    fn test_request_validation() {
        let err = MappingRequest::from_snapshot(&snapshot(), "   ").unwrap_err();
        assert!(matches!(err, AutofillError::InvalidRequest(_)));

        let err = MappingRequest::from_fields(Vec::new(), "fill it").unwrap_err();
        assert!(err.to_string().contains("formStructure"));
    }

    #[test]
    fn test_prompt_carries_schema() {
        let request = MappingRequest::from_snapshot(&snapshot(), "fill").unwrap();
        let prompt: Value = serde_json::from_str(&request.to_prompt().unwrap()).unwrap();
        assert_eq!(prompt["userInput"], "fill");
        assert!(prompt["responseSchema"].to_string().contains("fields"));
        assert_eq!(prompt["formStructure"][0]["elementType"], "InputElement");
    }

    #[test]
    fn test_mapped_field_deserialization() {
        let field: MappedField = serde_json::from_value(json!({
            "type": "checkbox",
            "name": "tos",
            "value": 1,
            "status": "filled",
            "attributes": { "aria-label": "Terms" }
        }))
        .unwrap();
        assert_eq!(field.field_type.as_deref(), Some("checkbox"));
        assert_eq!(field.value_text().as_deref(), Some("1"));
        assert_eq!(field.aria_label(), Some("Terms"));
    }

    #[test]
    fn test_null_value_is_absent() {
        let field: MappedField = serde_json::from_value(json!({ "id": "x", "value": null })).unwrap();
        assert_eq!(field.value_text(), None);
        assert_eq!(field.status, FieldStatus::Filled);
    }

    #[test]
    fn test_identifier() {
        let field = MappedField::new("email").with_id("email").with_label("Email");
        assert_eq!(field.identifier(), "Field (Type: email, Name: N/A, ID: email, Label: Email)");
        assert_eq!(
            MappedField::default().identifier(),
            "Field (Type: N/A, Name: N/A, ID: N/A, Label: N/A)"
        );
    }

    #[test]
    fn test_response_accepts_legacy_key() {
        let response: MappingResponse = serde_json::from_value(json!({
            "status": "partial",
            "formStructure": [{ "id": "a", "value": "x", "status": "waiting" }]
        }))
        .unwrap();
        assert_eq!(response.status, MappingStatus::Partial);
        assert_eq!(response.waiting().count(), 1);
    }

    #[test]
    fn test_missing_status_reads_as_completed() {
        let response: MappingResponse = serde_json::from_value(json!({
            "fields": [{ "name": "city", "value": "Paris" }]
        }))
        .unwrap();
        assert_eq!(response.status, MappingStatus::Completed);
        assert_eq!(response.fields[0].status, FieldStatus::Filled);

        // Only absence defaults; an unknown status is rejected
        let unknown = serde_json::from_value::<MappingResponse>(json!({ "status": "done", "fields": [] }));
        assert!(unknown.is_err());
    }
}
