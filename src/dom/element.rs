use serde::{Deserialize, Serialize};

/// Markup longer than this is stored as a head + tail excerpt
pub const RAW_HTML_LIMIT: usize = 1000;

const RAW_HTML_HEAD: usize = 200;
const RAW_HTML_TAIL: usize = 50;
const TRUNCATION_MARKER: &str = "...[truncated]...";

/// Head-only budget for the markup of nested `<option>`s
pub const OPTION_HTML_LIMIT: usize = 200;

/// A captured form-relevant node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementRecord {
    /// Lowercase tag name of the source element
    pub tag: String,

    #[serde(flatten)]
    pub base: BaseAttributes,

    #[serde(flatten)]
    pub kind: ElementKind,

    /// Surviving children, only ever set on container tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementRecord>,
}

/// Identity attributes shared by every record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaseAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_test_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_labelled_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_described_by: Option<String>,

    #[serde(default)]
    pub is_visible: bool,

    /// Trimmed text of the first child, when that child is a text node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    #[serde(default, rename = "rawOuterHTML", skip_serializing_if = "Option::is_none")]
    pub raw_outer_html: Option<String>,

    /// Resolved human-readable label, set on form controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Type-specific part of a record, discriminated by `elementType`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "elementType")]
pub enum ElementKind {
    #[serde(rename = "InputElement")]
    Input(InputFields),
    #[serde(rename = "TextAreaElement")]
    TextArea(TextAreaFields),
    #[serde(rename = "SelectElement")]
    Select(SelectFields),
    #[serde(rename = "ButtonElement")]
    Button(ButtonFields),
    #[serde(rename = "LabelElement")]
    Label(LabelFields),
    #[serde(rename = "FormElement")]
    Form(FormFields),
    #[serde(rename = "FieldSetElement")]
    FieldSet(FieldSetFields),
    #[serde(rename = "GenericElement")]
    Generic(GenericFields),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputFields {
    #[serde(rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    /// Only present for checkboxes and radios
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextAreaFields {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    pub rows: u32,
    pub cols: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectFields {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<OptionRecord>,
}

/// One `<option>` of a captured select
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "elementType", rename = "OptionElement")]
pub struct OptionRecord {
    pub tag: String,
    #[serde(flatten)]
    pub base: BaseAttributes,
    pub value: String,
    pub text: String,
    pub selected: bool,
    pub disabled: bool,
    pub index: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ButtonFields {
    pub button_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Form submission attributes; the form's `name` lives in [`BaseAttributes`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldSetFields {
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenericFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ElementKind {
    /// Wire name of the discriminant
    pub fn element_type(&self) -> &'static str {
        match self {
            ElementKind::Input(_) => "InputElement",
            ElementKind::TextArea(_) => "TextAreaElement",
            ElementKind::Select(_) => "SelectElement",
            ElementKind::Button(_) => "ButtonElement",
            ElementKind::Label(_) => "LabelElement",
            ElementKind::Form(_) => "FormElement",
            ElementKind::FieldSet(_) => "FieldSetElement",
            ElementKind::Generic(_) => "GenericElement",
        }
    }

    /// Whether the record describes something a user can fill or press
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            ElementKind::Input(_) | ElementKind::TextArea(_) | ElementKind::Select(_) | ElementKind::Button(_)
        )
    }
}

impl ElementRecord {
    /// Create a new ElementRecord
    pub fn new(tag: impl Into<String>, base: BaseAttributes, kind: ElementKind) -> Self {
        Self {
            tag: tag.into(),
            base,
            kind,
            children: Vec::new(),
        }
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementRecord>) -> Self {
        self.children = children;
        self
    }

    pub fn element_type(&self) -> &'static str {
        self.kind.element_type()
    }

    pub fn id(&self) -> Option<&str> {
        self.base.id.as_deref()
    }

    /// Number of levels in this subtree, the record itself counting as one
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(ElementRecord::depth).max().unwrap_or(0)
    }

    /// Visit this record and every descendant in document order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ElementRecord)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// First record in this subtree with the given id
    pub fn find_by_id(&self, id: &str) -> Option<&ElementRecord> {
        let mut found = None;
        self.walk(&mut |record| {
            if found.is_none() && record.id() == Some(id) {
                found = Some(record);
            }
        });
        found
    }
}

/// Cap markup at [`RAW_HTML_LIMIT`] characters, keeping 200 from the start and 50 from the end
pub fn truncate_outer_html(html: &str) -> String {
    let length = html.chars().count();
    if length < RAW_HTML_LIMIT {
        return html.to_string();
    }
    let head: String = html.chars().take(RAW_HTML_HEAD).collect();
    let tail: String = html.chars().skip(length - RAW_HTML_TAIL).collect();
    format!("{}{}{}", head, TRUNCATION_MARKER, tail)
}

/// Cap option markup at [`OPTION_HTML_LIMIT`] characters, head only
pub fn truncate_option_html(html: &str) -> String {
    if html.chars().count() <= OPTION_HTML_LIMIT {
        return html.to_string();
    }
    let head: String = html.chars().take(OPTION_HTML_LIMIT).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_record_serialization() {
        let record = ElementRecord::new(
            "input",
            BaseAttributes {
                id: Some("email".to_string()),
                is_visible: true,
                label: Some("Email".to_string()),
                ..Default::default()
            },
            ElementKind::Input(InputFields {
                input_type: "email".to_string(),
                required: true,
                ..Default::default()
            }),
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["elementType"], "InputElement");
        assert_eq!(value["tag"], "input");
        assert_eq!(value["type"], "email");
        assert_eq!(value["isVisible"], true);
        assert_eq!(value["required"], true);
        assert!(value.get("checked").is_none());
        assert!(value.get("children").is_none());
        assert!(value.get("className").is_none());
    }

    #[test]
    fn test_generic_and_children() {
        let child = ElementRecord::new("input", BaseAttributes::default(), ElementKind::Input(InputFields::default()));
        let form = ElementRecord::new(
            "form",
            BaseAttributes {
                id: Some("signup".to_string()),
                ..Default::default()
            },
            ElementKind::Form(FormFields {
                method: Some("post".to_string()),
                ..Default::default()
            }),
        )
        .with_children(vec![child]);
        let wrapper = ElementRecord::new("div", BaseAttributes::default(), ElementKind::Generic(GenericFields::default())).with_children(vec![form]);

        let value = serde_json::to_value(&wrapper).unwrap();
        assert_eq!(value["elementType"], "GenericElement");
        assert_eq!(value["children"][0]["elementType"], "FormElement");
        assert_eq!(value["children"][0]["method"], "post");
        assert_eq!(wrapper.depth(), 3);
        assert!(wrapper.find_by_id("signup").is_some());
    }

    #[test]
    fn test_option_record_tag() {
        let option = OptionRecord {
            tag: "option".to_string(),
            base: BaseAttributes::default(),
            value: "de".to_string(),
            text: "Germany".to_string(),
            selected: false,
            disabled: false,
            index: 0,
        };
        let value = serde_json::to_value(&option).unwrap();
        assert_eq!(
            value,
            json!({
                "elementType": "OptionElement",
                "tag": "option",
                "isVisible": false,
                "value": "de",
                "text": "Germany",
                "selected": false,
                "disabled": false,
                "index": 0
            })
        );
    }

    #[test]
    fn test_truncate_outer_html() {
        let short = "a".repeat(999);
        assert_eq!(truncate_outer_html(&short), short);

        let long = format!("{}{}{}", "h".repeat(200), "m".repeat(750), "t".repeat(50));
        let truncated = truncate_outer_html(&long);
        assert_eq!(truncated, format!("{}...[truncated]...{}", "h".repeat(200), "t".repeat(50)));
        assert!(truncated.len() < long.len());
    }

    #[test]
    fn test_truncate_option_html() {
        assert_eq!(truncate_option_html("<option>a</option>"), "<option>a</option>");
        let long = "x".repeat(201);
        assert_eq!(truncate_option_html(&long), format!("{}...", "x".repeat(200)));
    }
}
