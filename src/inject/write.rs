//! Writing one instructed value into a located element.

use crate::dom::document::{Document, EventKind, NodeId};
use crate::inject::FieldWarning;
use crate::mapping::{FieldStatus, MappedField};
use serde_json::Value;

const TRUTHY: [&str; 4] = ["true", "checked", "on", "yes"];

/// Whether a checkbox should end up checked.
///
/// An explicit `checked` wins; otherwise the value is read as a flag:
/// `true`, `1` or one of `true`/`checked`/`on`/`yes` in any case.
pub fn checkbox_intent(field: &MappedField) -> bool {
    if let Some(checked) = field.checked {
        return checked;
    }
    match &field.value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => {
            let s = s.trim().to_ascii_lowercase();
            TRUTHY.contains(&s.as_str())
        }
        _ => false,
    }
}

/// Whether the field asks for anything at all
pub fn has_intent(field: &MappedField) -> bool {
    field.value_text().is_some() || field.checked.is_some() || is_button_field(field)
}

fn is_button_field(field: &MappedField) -> bool {
    let field_type = field.field_type.as_deref().unwrap_or_default().to_ascii_lowercase();
    let tag = field.tag.as_deref().unwrap_or_default().to_ascii_lowercase();
    tag == "button" || matches!(field_type.as_str(), "button" | "submit")
}

/// Programmatic change notification: `input`, `change`, `blur`
fn notify(document: &mut Document, node: NodeId) {
    for kind in [EventKind::Input, EventKind::Change, EventKind::Blur] {
        document.dispatch(node, kind);
    }
}

/// Apply `field` to `node`. `Ok` means the element now holds the instructed
/// state; every refusal comes back as a warning and leaves the element as it was.
pub fn write_field(document: &mut Document, node: NodeId, field: &MappedField) -> Result<(), FieldWarning> {
    let identifier = field.identifier();
    if document.is_disabled(node) {
        return Err(FieldWarning::Disabled(identifier));
    }
    if document.is_readonly(node) {
        return Err(FieldWarning::ReadOnly(identifier));
    }

    let tag = document.tag(node).unwrap_or_default().to_string();
    match tag.as_str() {
        "input" => match document.input_type(node).as_str() {
            "file" => Err(FieldWarning::FileInput(identifier)),
            "checkbox" => {
                document.set_checked(node, checkbox_intent(field));
                notify(document, node);
                Ok(())
            }
            "radio" => write_radio(document, node, field),
            "submit" | "button" | "reset" | "image" => click_button(document, node, field),
            _ => write_text(document, node, field),
        },
        "textarea" => write_text(document, node, field),
        "select" => write_select(document, node, field),
        "button" => click_button(document, node, field),
        other => Err(FieldWarning::Unsupported {
            field: identifier,
            tag: other.to_string(),
        }),
    }
}

fn required_value(field: &MappedField) -> Result<String, FieldWarning> {
    field
        .value_text()
        .ok_or_else(|| FieldWarning::MissingValue(field.identifier()))
}

fn write_text(document: &mut Document, node: NodeId, field: &MappedField) -> Result<(), FieldWarning> {
    let value = required_value(field)?;
    document.set_value(node, &value);
    notify(document, node);
    Ok(())
}

fn write_select(document: &mut Document, node: NodeId, field: &MappedField) -> Result<(), FieldWarning> {
    let value = required_value(field)?;
    if !document.has_option_value(node, &value) {
        return Err(FieldWarning::MissingOption {
            field: field.identifier(),
            option: value,
        });
    }
    document.set_select_value(node, &value);
    notify(document, node);
    Ok(())
}

/// Check the radio of the located element's group whose value matches.
/// A radio without a name can only be checked when its own value matches.
fn write_radio(document: &mut Document, node: NodeId, field: &MappedField) -> Result<(), FieldWarning> {
    let value = required_value(field)?;
    let group = document.radio_group(node);
    let Some(target) = group.into_iter().find(|radio| document.value(*radio) == value) else {
        return Err(FieldWarning::MissingRadio {
            field: field.identifier(),
            name: document.attr(node, "name").unwrap_or_default().to_string(),
            value,
        });
    };
    if document.is_disabled(target) {
        return Err(FieldWarning::Disabled(field.identifier()));
    }
    document.set_checked(target, true);
    notify(document, target);
    Ok(())
}

/// Click on an explicit `click` value, or on a submit button the model left
/// without a value. Buttons still waiting on the user are left alone.
fn click_button(document: &mut Document, node: NodeId, field: &MappedField) -> Result<(), FieldWarning> {
    if field.status == FieldStatus::Waiting {
        return Err(FieldWarning::Waiting(field.identifier()));
    }
    let wants_click = match field.value_text() {
        Some(value) => value.trim().eq_ignore_ascii_case("click"),
        None => {
            let button_type = if document.is_tag(node, "button") {
                document
                    .attr(node, "type")
                    .map(|t| t.trim().to_ascii_lowercase())
                    .unwrap_or_else(|| "submit".to_string())
            } else {
                document.input_type(node)
            };
            button_type == "submit"
        }
    };
    if !wants_click {
        return Err(FieldWarning::NoClickIntent(field.identifier()));
    }
    document.click(node);
    Ok(())
}
