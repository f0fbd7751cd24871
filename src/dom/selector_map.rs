use crate::dom::document::{Document, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Information needed to find a document node again in a live browser tab
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementSelector {
    /// CSS selector for the element
    pub css_selector: String,

    /// Element's tag name
    pub tag_name: String,

    /// Element's ID attribute (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Element's name attribute (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ElementSelector {
    /// Create a new ElementSelector with CSS selector
    pub fn new(css_selector: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            css_selector: css_selector.into(),
            tag_name: tag_name.into(),
            id: None,
            name: None,
        }
    }

    /// Builder method: set ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method: set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build the selector for a document node.
    ///
    /// An id that is unique in the document and a plain CSS identifier gives
    /// `#id`; anything else gets an `nth-of-type` path from `body`. The id and
    /// name are only kept when no other element shares them.
    pub fn for_node(document: &Document, node: NodeId) -> Self {
        let tag = document.tag(node).unwrap_or_default();
        let unique = |attr: &str| {
            document
                .non_empty_attr(node, attr)
                .filter(|&value| document.find_all(|other| document.attr(other, attr) == Some(value)).len() == 1)
        };
        let id = unique("id");

        let css_selector = match id.filter(|id| is_css_identifier(id)) {
            Some(id) => format!("#{}", id),
            None => css_path(document, node),
        };

        let mut selector = Self::new(css_selector, tag);
        if let Some(id) = id {
            selector = selector.with_id(id);
        }
        if let Some(name) = unique("name") {
            selector = selector.with_name(name);
        }
        selector
    }

    /// Get the best selector to use
    pub fn best_selector(&self) -> &str {
        &self.css_selector
    }

    /// Selectors to try in order: the best one, then attribute selectors on
    /// the id and name for when the live page's structure has shifted
    pub fn candidates(&self) -> Vec<String> {
        let mut candidates = vec![self.css_selector.clone()];
        if let Some(id) = self.id.as_deref().filter(|id| !is_css_identifier(id)) {
            candidates.push(format!("{}[id=\"{}\"]", self.tag_name, css_string(id)));
        }
        if let Some(name) = &self.name {
            candidates.push(format!("{}[name=\"{}\"]", self.tag_name, css_string(name)));
        }
        candidates
    }
}

/// Escape a value for use inside a double-quoted CSS attribute selector
fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\{:x} ", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// `body > div:nth-of-type(2) > input:nth-of-type(1)` style path to `node`
pub fn css_path(document: &Document, node: NodeId) -> String {
    let mut segments = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        let Some(tag) = document.tag(id) else {
            break;
        };
        if tag == "body" || tag == "html" {
            segments.push(tag.to_string());
            break;
        }
        segments.push(format!("{}:nth-of-type({})", tag, document.index_of_type(id)));
        current = document.parent_element(id);
    }
    segments.reverse();
    segments.join(" > ")
}

fn is_css_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Map of document nodes to their selectors
/// Uses IndexMap to preserve insertion order
#[derive(Debug, Clone, Default)]
pub struct SelectorMap {
    map: IndexMap<NodeId, ElementSelector>,
}

impl SelectorMap {
    /// Create a new empty SelectorMap
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    /// Build selectors for every node in `nodes`
    pub fn for_nodes(document: &Document, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut map = Self::new();
        for node in nodes {
            if document.is_element(node) && !map.contains(node) {
                map.register(node, ElementSelector::for_node(document, node));
            }
        }
        map
    }

    /// Register the selector of a node
    pub fn register(&mut self, node: NodeId, selector: ElementSelector) {
        self.map.insert(node, selector);
    }

    /// Get selector by node
    pub fn get(&self, node: NodeId) -> Option<&ElementSelector> {
        self.map.get(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.map.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(
            "<html><body><div><p>intro</p></div><div><form>\
             <input id=\"email\" name=\"email\"><input name=\"zip\">\
             <input id=\"dup\"><input id=\"dup\"><input id=\"2fa\" name=\"code\">\
             <input type=\"radio\" name=\"plan\"><input type=\"radio\" name=\"plan\"></form></div></body></html>",
        )
    }

    #[test]
    fn test_unique_id_selector() {
        let doc = doc();
        let email = doc.get_element_by_id("email").unwrap();
        let selector = ElementSelector::for_node(&doc, email);

        assert_eq!(selector.best_selector(), "#email");
        assert_eq!(selector.tag_name, "input");
        assert_eq!(selector.name.as_deref(), Some("email"));
        assert_eq!(selector.candidates(), vec!["#email", "input[name=\"email\"]"]);
    }

    #[test]
    fn test_path_selector() {
        let doc = doc();
        let zip = doc.get_elements_by_name("zip")[0];
        assert_eq!(
            css_path(&doc, zip),
            "body > div:nth-of-type(2) > form:nth-of-type(1) > input:nth-of-type(2)"
        );
    }

    #[test]
    fn test_duplicate_or_invalid_id_falls_back_to_path() {
        let doc = doc();
        let dup = doc.get_element_by_id("dup").unwrap();
        let selector = ElementSelector::for_node(&doc, dup);
        assert!(selector.css_selector.ends_with("input:nth-of-type(3)"));
        assert_eq!(selector.id, None);
        assert_eq!(selector.candidates().len(), 1);

        let digit = doc.get_element_by_id("2fa").unwrap();
        let selector = ElementSelector::for_node(&doc, digit);
        assert!(selector.css_selector.starts_with("body > "));
        assert_eq!(
            selector.candidates()[1..],
            ["input[id=\"2fa\"]".to_string(), "input[name=\"code\"]".to_string()]
        );
    }

    #[test]
    fn test_shared_name_is_not_a_fallback() {
        let doc = doc();
        let radio = doc.get_elements_by_name("plan")[0];
        let selector = ElementSelector::for_node(&doc, radio);
        assert_eq!(selector.name, None);
        assert_eq!(selector.candidates(), vec![selector.css_selector.clone()]);
    }

    #[test]
    fn test_css_string_escapes_quotes() {
        assert_eq!(css_string(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn test_selector_map_for_nodes() {
        let doc = doc();
        let inputs = doc.elements_by_tag("input");
        let map = SelectorMap::for_nodes(&doc, inputs.iter().copied().chain(inputs.iter().copied()));

        assert_eq!(map.len(), inputs.len());
        assert!(map.contains(inputs[0]));
        assert_eq!(map.get(inputs[0]).map(ElementSelector::best_selector), Some("#email"));
        assert!(SelectorMap::new().is_empty());
    }
}
