//! Flat field listing for already-serialized HTML.
//!
//! Unlike the structural extractor this does not build a tree: every
//! `input`, `textarea`, `select` and `button` in the document becomes one
//! [`FieldDescriptor`].

use crate::dom::document::{Document, NodeId};
use crate::dom::label::LabelResolver;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const FIELD_TAGS: [&str; 4] = ["input", "textarea", "select", "button"];

/// One form control found in serialized HTML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub tag: String,

    /// Every attribute of the control, in source order
    pub attributes: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Trimmed text content, `null` when there is none
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionDescriptor>>,
}

/// A select option as `{label, value, text}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionDescriptor {
    pub label: String,
    pub value: String,
    pub text: String,
}

/// Parse `html` and list its form controls
pub fn extract_fields(html: &str) -> Vec<FieldDescriptor> {
    if html.trim().is_empty() {
        log::warn!("HTML content is empty, cannot structure form");
        return Vec::new();
    }
    let fields = extract_fields_from(&Document::parse(html));
    log::debug!("Form structured with {} fields", fields.len());
    fields
}

/// List the form controls of an already parsed document
pub fn extract_fields_from(document: &Document) -> Vec<FieldDescriptor> {
    let resolver = LabelResolver::detached();
    document
        .find_all(|node| document.tag(node).is_some_and(|tag| FIELD_TAGS.contains(&tag)))
        .into_iter()
        .map(|node| describe(document, &resolver, node))
        .collect()
}

fn describe(document: &Document, resolver: &LabelResolver, node: NodeId) -> FieldDescriptor {
    let tag = document.tag(node).unwrap_or_default().to_string();
    let non_empty = |value: String| if value.is_empty() { None } else { Some(value) };

    let label = non_empty(resolver.resolve(document, node));
    let text = non_empty(document.text_content(node).trim().to_string());
    let value = non_empty(document.value(node));

    let (placeholder, required) = match tag.as_str() {
        "input" | "textarea" => (
            document.non_empty_attr(node, "placeholder").map(str::to_string),
            document.has_attr(node, "required"),
        ),
        "select" => (None, document.has_attr(node, "required")),
        _ => (None, false),
    };

    let options = (tag == "select").then(|| {
        document
            .options(node)
            .into_iter()
            .map(|option| OptionDescriptor {
                label: document.option_label(option),
                value: document.option_value(option),
                text: document.option_text(option),
            })
            .collect()
    });

    FieldDescriptor {
        field_type: Some(field_type(document, node, &tag)),
        attributes: document.attributes(node).cloned().unwrap_or_default(),
        id: document.non_empty_attr(node, "id").map(str::to_string),
        name: document.non_empty_attr(node, "name").map(str::to_string),
        placeholder,
        label,
        text,
        value,
        required,
        options,
        tag,
    }
}

/// The control's `type` property, lowercased
fn field_type(document: &Document, node: NodeId, tag: &str) -> String {
    match tag {
        "input" => document.input_type(node),
        "textarea" => "textarea".to_string(),
        "select" if document.has_attr(node, "multiple") => "select-multiple".to_string(),
        "select" => "select-one".to_string(),
        _ => document
            .attr(node, "type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| matches!(t.as_str(), "submit" | "reset" | "button"))
            .unwrap_or_else(|| "submit".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_html() {
        assert!(extract_fields("   ").is_empty());
    }

    #[test]
    fn test_flat_listing_in_document_order() {
        let fields = extract_fields(
            "<form><div><label for=\"first\">First name</label><input id=\"first\" name=\"first\" required></div>\
             <textarea name=\"bio\" placeholder=\"About you\">hello</textarea>\
             <button type=\"reset\">Clear</button></form>",
        );
        let tags: Vec<_> = fields.iter().map(|f| f.tag.as_str()).collect();
        assert_eq!(tags, vec!["input", "textarea", "button"]);

        let first = &fields[0];
        assert_eq!(first.label.as_deref(), Some("First name"));
        assert_eq!(first.field_type.as_deref(), Some("text"));
        assert!(first.required);
        assert_eq!(first.value, None);
        assert_eq!(first.text, None);
        assert_eq!(first.attributes.get("name").map(String::as_str), Some("first"));

        let bio = &fields[1];
        assert_eq!(bio.field_type.as_deref(), Some("textarea"));
        assert_eq!(bio.placeholder.as_deref(), Some("About you"));
        assert_eq!(bio.value.as_deref(), Some("hello"));

        let button = &fields[2];
        assert_eq!(button.field_type.as_deref(), Some("reset"));
        assert_eq!(button.text.as_deref(), Some("Clear"));
    }

    #[test]
    fn test_wrapping_label_without_controls() {
        let fields = extract_fields("<label>Subscribe <input type=\"checkbox\" name=\"sub\"></label>");
        assert_eq!(fields[0].label.as_deref(), Some("Subscribe"));
        assert_eq!(fields[0].field_type.as_deref(), Some("checkbox"));
        assert_eq!(fields[0].value.as_deref(), Some("on"));
    }

    #[test]
    fn test_select_options() {
        let fields = extract_fields(
            "<select name=\"plan\" multiple><option value=\"f\" label=\"Free tier\">Free</option><option>Pro</option></select>",
        );
        let select = &fields[0];
        assert_eq!(select.field_type.as_deref(), Some("select-multiple"));
        assert_eq!(
            select.options.as_deref(),
            Some(
                &[
                    OptionDescriptor {
                        label: "Free tier".to_string(),
                        value: "f".to_string(),
                        text: "Free".to_string(),
                    },
                    OptionDescriptor {
                        label: "Pro".to_string(),
                        value: "Pro".to_string(),
                        text: "Pro".to_string(),
                    },
                ][..]
            )
        );
    }

    #[test]
    fn test_serialized_shape() {
        let fields = extract_fields("<input id=\"q\">");
        let value = serde_json::to_value(&fields[0]).unwrap();
        assert_eq!(value["tag"], "input");
        assert_eq!(value["type"], "text");
        assert!(value["text"].is_null());
        assert!(value.get("required").is_none());
        assert!(value.get("value").is_none());
        assert!(value.get("options").is_none());
    }
}
