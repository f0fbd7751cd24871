//! Finding the element a mapped field refers to.
//!
//! The page may have re-rendered since it was captured, so each field is
//! looked up again through an ordered list of locators. A locator returns
//! `Ok(None)` to pass to the next one and `Err` when the field cannot be
//! resolved safely at all.

use crate::dom::document::{Document, NodeId};
use crate::dom::label::normalize_label;
use crate::inject::FieldWarning;
use crate::mapping::MappedField;

/// One element lookup strategy
pub type Locator = fn(&Document, &MappedField) -> Result<Option<NodeId>, FieldWarning>;

const CONTROL_TAGS: [&str; 4] = ["input", "textarea", "select", "button"];

/// The lookup cascade, in the order it is tried
pub fn default_locators() -> Vec<(&'static str, Locator)> {
    vec![
        ("id", by_id as Locator),
        ("name", by_name),
        ("aria-label", by_aria_label),
        ("label", by_label_text),
        ("placeholder", by_placeholder),
        ("unique-type", by_unique_type),
    ]
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn is_control(document: &Document, node: NodeId) -> bool {
    document.tag(node).is_some_and(|tag| CONTROL_TAGS.contains(&tag))
}

/// Reject identifiers carrying control characters before they reach any lookup
pub fn check_identifiers(field: &MappedField) -> Result<(), FieldWarning> {
    let identifiers = [&field.id, &field.name, &field.label, &field.placeholder, &field.aria_label];
    let malformed = identifiers
        .iter()
        .filter_map(|value| value.as_deref())
        .find(|value| value.chars().any(|c| c.is_control() && !c.is_whitespace()));

    match malformed {
        Some(value) => Err(FieldWarning::Processing {
            field: non_empty(&field.name)
                .or(non_empty(&field.id))
                .unwrap_or("unknown field")
                .to_string(),
            reason: format!("malformed identifier {:?}", value),
        }),
        None => Ok(()),
    }
}

/// Exact `id`
pub fn by_id(document: &Document, field: &MappedField) -> Result<Option<NodeId>, FieldWarning> {
    Ok(non_empty(&field.id).and_then(|id| document.get_element_by_id(id)))
}

/// Exact `name`.
///
/// Several elements can share a name. A radio group resolves to its first
/// member since the radio write picks the member by value; otherwise the
/// candidates are narrowed by `value` attribute, then by type. A name that
/// stays ambiguous passes to the next locator, see [`name_ambiguity`].
pub fn by_name(document: &Document, field: &MappedField) -> Result<Option<NodeId>, FieldWarning> {
    Ok(match_name(document, field).ok().flatten())
}

/// The warning for a field whose `name` matches several elements that
/// nothing could tell apart
pub fn name_ambiguity(document: &Document, field: &MappedField) -> Option<FieldWarning> {
    match_name(document, field).err()
}

fn match_name(document: &Document, field: &MappedField) -> Result<Option<NodeId>, FieldWarning> {
    let Some(name) = non_empty(&field.name) else {
        return Ok(None);
    };
    let candidates = document.get_elements_by_name(name);
    match candidates.len() {
        0 => return Ok(None),
        1 => return Ok(Some(candidates[0])),
        _ => {}
    }

    let is_radio = |node: NodeId| document.is_tag(node, "input") && document.input_type(node) == "radio";
    if candidates.iter().all(|node| is_radio(*node)) {
        return Ok(Some(candidates[0]));
    }

    if let Some(value) = field.value_text() {
        let by_value: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|node| document.attr(*node, "value") == Some(value.as_str()))
            .collect();
        if by_value.len() == 1 {
            return Ok(Some(by_value[0]));
        }
    }

    if let Some(field_type) = non_empty(&field.field_type) {
        let field_type = field_type.to_ascii_lowercase();
        let by_type: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|node| {
                let node_type = if document.is_tag(*node, "input") {
                    document.input_type(*node)
                } else {
                    document.tag(*node).unwrap_or_default().to_string()
                };
                node_type == field_type
            })
            .collect();
        if by_type.len() == 1 {
            return Ok(Some(by_type[0]));
        }
    }

    Err(FieldWarning::Ambiguous {
        field: field.identifier(),
        name: name.to_string(),
        count: candidates.len(),
    })
}

/// Exact `aria-label`
pub fn by_aria_label(document: &Document, field: &MappedField) -> Result<Option<NodeId>, FieldWarning> {
    let Some(aria_label) = field.aria_label() else {
        return Ok(None);
    };
    Ok(document
        .find_all(|node| document.attr(node, "aria-label") == Some(aria_label))
        .into_iter()
        .next())
}

/// A `<label>` whose text equals the field label, ignoring case, then the
/// control it points at: its `for` target, a control inside it, or a control
/// among the siblings after it
pub fn by_label_text(document: &Document, field: &MappedField) -> Result<Option<NodeId>, FieldWarning> {
    let Some(wanted) = non_empty(&field.label).and_then(normalize_label) else {
        return Ok(None);
    };
    let wanted = wanted.to_lowercase();

    let label = document.elements_by_tag("label").into_iter().find(|label| {
        let text = document.text_content_excluding(*label, |node| is_control(document, node));
        normalize_label(&text).is_some_and(|text| text.to_lowercase() == wanted)
    });
    let Some(label) = label else {
        return Ok(None);
    };

    if let Some(target) = document.non_empty_attr(label, "for").and_then(|id| document.get_element_by_id(id)) {
        return Ok(Some(target));
    }

    let fillable = |node: NodeId| matches!(document.tag(node), Some("input" | "textarea" | "select"));
    if let Some(inner) = document.find_descendants(label, fillable).into_iter().next() {
        return Ok(Some(inner));
    }

    let Some(parent) = document.parent(label) else {
        return Ok(None);
    };
    for sibling in document.element_children(parent).skip_while(|node| *node != label).skip(1) {
        if document.is_tag(sibling, "label") {
            break;
        }
        if fillable(sibling) {
            return Ok(Some(sibling));
        }
        if let Some(nested) = document.find_descendants(sibling, fillable).into_iter().next() {
            return Ok(Some(nested));
        }
    }
    Ok(None)
}

/// Exact `placeholder`
pub fn by_placeholder(document: &Document, field: &MappedField) -> Result<Option<NodeId>, FieldWarning> {
    let Some(placeholder) = non_empty(&field.placeholder) else {
        return Ok(None);
    };
    Ok(document
        .find_all(|node| document.attr(node, "placeholder") == Some(placeholder))
        .into_iter()
        .next())
}

/// For `input` fields only: the single input of the same type, if there is exactly one
pub fn by_unique_type(document: &Document, field: &MappedField) -> Result<Option<NodeId>, FieldWarning> {
    let is_input = field.tag.as_deref().is_some_and(|tag| tag.eq_ignore_ascii_case("input"));
    let Some(field_type) = non_empty(&field.field_type).filter(|_| is_input) else {
        return Ok(None);
    };
    let field_type = field_type.to_ascii_lowercase();
    let inputs = document.find_all(|node| document.is_tag(node, "input") && document.input_type(node) == field_type);
    Ok(match inputs.as_slice() {
        [only] => Some(*only),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse(&format!("<html><body>{}</body></html>", body))
    }

    #[test]
    fn test_by_id() {
        let doc = doc("<input id=\"a\">");
        let found = by_id(&doc, &MappedField::new("text").with_id("a")).unwrap();
        assert_eq!(found, doc.get_element_by_id("a"));
        assert_eq!(by_id(&doc, &MappedField::new("text").with_id("missing")).unwrap(), None);
        assert_eq!(by_id(&doc, &MappedField::new("text")).unwrap(), None);
    }

    #[test]
    fn test_by_name_single_and_radio_group() {
        let doc = doc(
            "<input name=\"city\" id=\"city\">\
             <input type=\"radio\" name=\"size\" value=\"s\" id=\"s\"><input type=\"radio\" name=\"size\" value=\"m\">",
        );
        assert_eq!(
            by_name(&doc, &MappedField::new("text").with_name("city")).unwrap(),
            doc.get_element_by_id("city")
        );
        assert_eq!(
            by_name(&doc, &MappedField::new("radio").with_name("size").with_value("m")).unwrap(),
            doc.get_element_by_id("s")
        );
    }

    #[test]
    fn test_by_name_narrows_by_value() {
        let doc = doc(
            "<input type=\"checkbox\" name=\"topics\" value=\"rust\" id=\"rust\">\
             <input type=\"checkbox\" name=\"topics\" value=\"go\">",
        );
        let field = MappedField::new("checkbox").with_name("topics").with_value("rust");
        assert_eq!(by_name(&doc, &field).unwrap(), doc.get_element_by_id("rust"));
    }

    #[test]
    fn test_by_name_narrows_by_type() {
        let doc = doc("<input type=\"hidden\" name=\"agree\" value=\"0\"><input type=\"checkbox\" name=\"agree\" id=\"box\">");
        let field = MappedField::new("checkbox").with_name("agree").with_checked(true);
        assert_eq!(by_name(&doc, &field).unwrap(), doc.get_element_by_id("box"));
    }

    #[test]
    fn test_by_name_ambiguous() {
        let doc = doc("<input type=\"checkbox\" name=\"opt\" value=\"a\"><input type=\"checkbox\" name=\"opt\" value=\"b\">");
        let field = MappedField::new("checkbox").with_name("opt").with_value("true");
        assert_eq!(by_name(&doc, &field).unwrap(), None);
        assert!(matches!(name_ambiguity(&doc, &field), Some(FieldWarning::Ambiguous { count: 2, .. })));

        let single = MappedField::new("checkbox").with_name("opt").with_value("a");
        assert!(name_ambiguity(&doc, &single).is_none());
    }

    #[test]
    fn test_by_aria_label() {
        let doc = doc("<input id=\"s\" aria-label=\"Search\">");
        let field = MappedField::new("text").with_aria_label("Search");
        assert_eq!(by_aria_label(&doc, &field).unwrap(), doc.get_element_by_id("s"));
    }

    #[test]
    fn test_by_label_text_variants() {
        let doc = doc(
            "<label for=\"e\">E-mail</label><input id=\"e\">\
             <label>Phone <input id=\"p\"></label>\
             <div><label>Country</label><span><select id=\"c\"></select></span></div>",
        );
        let field = |label: &str| MappedField::new("text").with_label(label);
        assert_eq!(by_label_text(&doc, &field("e-mail")).unwrap(), doc.get_element_by_id("e"));
        assert_eq!(by_label_text(&doc, &field("PHONE")).unwrap(), doc.get_element_by_id("p"));
        assert_eq!(by_label_text(&doc, &field(" Country ")).unwrap(), doc.get_element_by_id("c"));
        assert_eq!(by_label_text(&doc, &field("Fax")).unwrap(), None);
    }

    #[test]
    fn test_by_label_text_with_dangling_for() {
        let doc = doc(
            "<label for=\"gone\">Email <input id=\"inner\"></label>\
             <div><label for=\"also-gone\">Phone</label><input id=\"next\"></div>",
        );
        let field = |label: &str| MappedField::new("text").with_label(label);
        assert_eq!(by_label_text(&doc, &field("Email")).unwrap(), doc.get_element_by_id("inner"));
        assert_eq!(by_label_text(&doc, &field("Phone")).unwrap(), doc.get_element_by_id("next"));
    }

    #[test]
    fn test_by_placeholder() {
        let doc = doc("<input id=\"z\" placeholder=\"ZIP code\">");
        let field = MappedField::new("text").with_placeholder("ZIP code");
        assert_eq!(by_placeholder(&doc, &field).unwrap(), doc.get_element_by_id("z"));
    }

    #[test]
    fn test_by_unique_type() {
        let doc = doc("<input type=\"email\" id=\"m\"><input type=\"text\"><input>");
        let email = MappedField::new("email").with_tag("input");
        assert_eq!(by_unique_type(&doc, &email).unwrap(), doc.get_element_by_id("m"));

        let text = MappedField::new("text").with_tag("input");
        assert_eq!(by_unique_type(&doc, &text).unwrap(), None);

        let untagged = MappedField::new("email");
        assert_eq!(by_unique_type(&doc, &untagged).unwrap(), None);
    }

    #[test]
    fn test_check_identifiers() {
        assert!(check_identifiers(&MappedField::new("text").with_label("Multi\nline")).is_ok());
        let err = check_identifiers(&MappedField::new("text").with_name("\u{0}bad")).unwrap_err();
        assert!(err.to_string().starts_with("Error processing \u{0}bad: malformed identifier"));
    }
}
