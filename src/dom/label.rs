//! Label resolution for form controls.
//!
//! A label is looked up through an ordered list of strategies; the first one
//! that yields non-empty text wins. Each strategy is a plain function so it
//! can be exercised on its own.

use crate::dom::document::{Document, NodeId};

/// One way of finding a label for a control
pub type LabelStrategy = fn(&Document, NodeId) -> Option<String>;

/// Tags that end the search for a wrapping `<label>`
const LABEL_BOUNDARY_TAGS: [&str; 2] = ["form", "body"];

/// Controls elided from a wrapping label's text in the detached cascade
const CONTROL_TAGS: [&str; 4] = ["input", "textarea", "select", "button"];

/// Ordered label strategy cascade
#[derive(Clone)]
pub struct LabelResolver {
    strategies: Vec<(&'static str, LabelStrategy)>,
}

impl std::fmt::Debug for LabelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelResolver")
            .field("strategies", &self.names())
            .finish()
    }
}

impl Default for LabelResolver {
    fn default() -> Self {
        Self::live()
    }
}

impl LabelResolver {
    /// Cascade used when walking a page: `label[for]`, `aria-labelledby`,
    /// `aria-label`, then a wrapping `<label>` inside the form/body boundary
    pub fn live() -> Self {
        Self {
            strategies: vec![
                ("label-for", label_for as LabelStrategy),
                ("aria-labelledby", aria_labelledby),
                ("aria-label", aria_label),
                ("wrapping-label", wrapping_label),
            ],
        }
    }

    /// Cascade used for serialized HTML: `label[for]`, then the closest
    /// wrapping `<label>` with every control removed from its text
    pub fn detached() -> Self {
        Self {
            strategies: vec![
                ("label-for", label_for as LabelStrategy),
                ("wrapping-label-without-controls", wrapping_label_without_controls),
            ],
        }
    }

    /// Build a resolver from an explicit strategy list
    pub fn with_strategies(strategies: Vec<(&'static str, LabelStrategy)>) -> Self {
        Self { strategies }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|(name, _)| *name).collect()
    }

    /// Best label for `element`, or `""` when no strategy finds one
    pub fn resolve(&self, document: &Document, element: NodeId) -> String {
        self.strategies
            .iter()
            .find_map(|(name, strategy)| {
                let label = strategy(document, element)?;
                log::trace!("label for node {} resolved by {}", element.index(), name);
                Some(label)
            })
            .unwrap_or_default()
    }
}

/// Trim and collapse internal whitespace; `None` when nothing is left
pub fn normalize_label(text: &str) -> Option<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() { None } else { Some(normalized) }
}

/// A `<label for="{id}">` with non-empty text
pub fn label_for(document: &Document, element: NodeId) -> Option<String> {
    let id = document.non_empty_attr(element, "id")?;
    document
        .elements_by_tag("label")
        .into_iter()
        .filter(|label| document.attr(*label, "for") == Some(id))
        .find_map(|label| normalize_label(&document.text_content(label)))
}

/// Text of the elements referenced by `aria-labelledby`, space-joined
pub fn aria_labelledby(document: &Document, element: NodeId) -> Option<String> {
    let ids = document.attr(element, "aria-labelledby")?;
    let parts: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id| document.get_element_by_id(id))
        .filter_map(|referenced| normalize_label(&document.text_content(referenced)))
        .collect();
    normalize_label(&parts.join(" "))
}

pub fn aria_label(document: &Document, element: NodeId) -> Option<String> {
    document.attr(element, "aria-label").and_then(normalize_label)
}

/// An ancestor `<label>` below the nearest form or body, read without the
/// control itself
pub fn wrapping_label(document: &Document, element: NodeId) -> Option<String> {
    let id = document.non_empty_attr(element, "id");
    let name = document.non_empty_attr(element, "name");

    let mut current = document.parent_element(element);
    while let Some(node) = current {
        let tag = document.tag(node)?;
        if LABEL_BOUNDARY_TAGS.contains(&tag) {
            return None;
        }
        if tag == "label" {
            let text = document.text_content_excluding(node, |descendant| {
                descendant == element
                    || (id.is_some() && document.attr(descendant, "id") == id)
                    || (name.is_some() && document.attr(descendant, "name") == name)
            });
            return normalize_label(&text);
        }
        current = document.parent_element(node);
    }
    None
}

/// Closest wrapping `<label>`, read with every control descendant removed
pub fn wrapping_label_without_controls(document: &Document, element: NodeId) -> Option<String> {
    let label = document.closest(element, "label")?;
    let text = document.text_content_excluding(label, |descendant| {
        document.tag(descendant).is_some_and(|tag| CONTROL_TAGS.contains(&tag))
    });
    normalize_label(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse(&format!("<html><body>{}</body></html>", body))
    }

    fn node(doc: &Document, id: &str) -> NodeId {
        doc.get_element_by_id(id).unwrap()
    }

    #[test]
    fn test_label_for() {
        let doc = doc("<label for=\"e\"></label><label for=\"e\">  E-mail\n address </label><input id=\"e\">");
        assert_eq!(label_for(&doc, node(&doc, "e")), Some("E-mail address".to_string()));
    }

    #[test]
    fn test_label_for_requires_id() {
        let doc = doc("<label for=\"\">Nothing</label><input name=\"x\" class=\"c\">");
        let input = doc.elements_by_tag("input")[0];
        assert_eq!(label_for(&doc, input), None);
    }

    #[test]
    fn test_aria_labelledby() {
        let doc = doc("<span id=\"a\">Billing</span><span id=\"b\">Zip</span><input id=\"z\" aria-labelledby=\"a missing b\">");
        assert_eq!(aria_labelledby(&doc, node(&doc, "z")), Some("Billing Zip".to_string()));
    }

    #[test]
    fn test_aria_label() {
        let doc = doc("<input id=\"q\" aria-label=\" Search \"><input id=\"blank\" aria-label=\"  \">");
        assert_eq!(aria_label(&doc, node(&doc, "q")), Some("Search".to_string()));
        assert_eq!(aria_label(&doc, node(&doc, "blank")), None);
    }

    #[test]
    fn test_wrapping_label_elides_control() {
        let doc = doc("<label>Country <select name=\"country\" id=\"c\"><option>France</option></select></label>");
        assert_eq!(wrapping_label(&doc, node(&doc, "c")), Some("Country".to_string()));
    }

    #[test]
    fn test_wrapping_label_stops_at_form() {
        let doc = doc("<label>Outer <form><div><input id=\"i\"></div></form></label>");
        assert_eq!(wrapping_label(&doc, node(&doc, "i")), None);
    }

    #[test]
    fn test_detached_wrapping_label_removes_all_controls() {
        let doc = doc("<label>Agree <input type=\"checkbox\" id=\"a\"><button>?</button></label>");
        assert_eq!(wrapping_label_without_controls(&doc, node(&doc, "a")), Some("Agree".to_string()));
    }

    #[test]
    fn test_label_for_beats_aria_label() {
        let doc = doc("<label for=\"n\">Full name</label><input id=\"n\" aria-label=\"Name\">");
        assert_eq!(LabelResolver::live().resolve(&doc, node(&doc, "n")), "Full name");
    }

    #[test]
    fn test_resolve_empty_when_nothing_matches() {
        let doc = doc("<input id=\"lonely\">");
        assert_eq!(LabelResolver::live().resolve(&doc, node(&doc, "lonely")), "");
        assert_eq!(LabelResolver::detached().resolve(&doc, node(&doc, "lonely")), "");
    }

    #[test]
    fn test_cascade_order() {
        assert_eq!(
            LabelResolver::live().names(),
            vec!["label-for", "aria-labelledby", "aria-label", "wrapping-label"]
        );
        let only_aria = LabelResolver::with_strategies(vec![("aria-label", aria_label as LabelStrategy)]);
        let doc = doc("<label for=\"n\">Full name</label><input id=\"n\" aria-label=\"Name\">");
        assert_eq!(only_aria.resolve(&doc, node(&doc, "n")), "Name");
    }
}
