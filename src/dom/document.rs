use html_escape::{encode_double_quoted_attribute, encode_text};
use indexmap::IndexMap;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

/// Elements that never have children or a closing tag
const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are serialized without escaping
const RAW_TEXT_TAGS: [&str; 6] = ["script", "style", "xmp", "iframe", "noembed", "noframes"];

/// Tags that never produce a layout box
const NON_RENDERED_TAGS: [&str; 9] = [
    "head", "title", "script", "style", "meta", "link", "template", "noscript", "base",
];

/// Input types a browser recognizes; anything else behaves like `text`
const KNOWN_INPUT_TYPES: [&str; 22] = [
    "text", "search", "tel", "url", "email", "password", "date", "month", "week", "time",
    "datetime-local", "number", "range", "color", "checkbox", "radio", "file", "submit", "image",
    "reset", "button", "hidden",
];

/// Handle to a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the document arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// Payload of a DOM node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// An element: its tag, its attributes in source order and its live form state
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,

    /// Attributes in source order
    pub attributes: IndexMap<String, String>,

    dirty_value: Option<String>,
    dirty_checked: Option<bool>,
    dirty_selected: Option<bool>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>, attributes: IndexMap<String, String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes,
            dirty_value: None,
            dirty_checked: None,
            dirty_selected: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Notification dispatched on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
    Blur,
    Click,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Blur => "blur",
            EventKind::Click => "click",
        }
    }
}

/// A recorded event dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
    pub cancelable: bool,
}

/// A property write made against the document, kept so it can be replayed
/// onto a real browser tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DomMutation {
    SetValue { target: NodeId, value: String },
    SetChecked { target: NodeId, checked: bool },
    SelectValue { target: NodeId, value: String },
    Click { target: NodeId },
}

impl DomMutation {
    pub fn target(&self) -> NodeId {
        match self {
            DomMutation::SetValue { target, .. }
            | DomMutation::SetChecked { target, .. }
            | DomMutation::SelectValue { target, .. }
            | DomMutation::Click { target } => *target,
        }
    }
}

/// Mutable, arena-backed HTML document.
///
/// Form controls carry the same value/checked/selected state a browser keeps
/// next to the attributes, so the document can stand in for a live page.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    events: Vec<DomEvent>,
    mutations: Vec<DomMutation>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with no content
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            events: Vec::new(),
            mutations: Vec::new(),
        }
    }

    /// Parse an HTML string into a document.
    ///
    /// The html5ever tree builder always produces `html`, `head` and `body`,
    /// so fragments come back wrapped in a full document.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut document = Self::new();
        let root = document.root();
        document.import_element(parsed.root_element(), root);
        document
    }

    fn import_element(&mut self, element: ElementRef<'_>, parent: NodeId) {
        let value = element.value();
        let attributes = value
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let id = self.append(parent, NodeData::Element(ElementData::new(value.name(), attributes)));

        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.import_element(child_element, id);
            } else if let Some(text) = child.value().as_text() {
                self.append(id, NodeData::Text(text.text.to_string()));
            } else if let Some(comment) = child.value().as_comment() {
                self.append(id, NodeData::Comment(comment.comment.to_string()));
            }
        }
    }

    /// Append a new node under `parent` and return its id
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Detach a node from its parent; the subtree stays in the arena but is unreachable
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    /// Document node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root()).next()
    }

    /// The `<body>` element
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.element_children(html).find(|child| self.is_tag(*child, "body"))
    }

    /// Text of the first `<title>` element, trimmed
    pub fn title(&self) -> Option<String> {
        let title = self.elements_by_tag("title").into_iter().next()?;
        let text = self.text_content(title).trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Comment(_))
    }

    /// Lowercase tag name, `None` for non-element nodes
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|parent| self.is_element(*parent))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
    }

    /// All descendants of `id` in document order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Element descendants of `id` matching `predicate`, in document order
    pub fn find_descendants(&self, id: NodeId, predicate: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|node| self.is_element(*node) && predicate(*node))
            .collect()
    }

    /// Every element of the document matching `predicate`
    pub fn find_all(&self, predicate: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
        self.find_descendants(self.root(), predicate)
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find_all(|node| self.is_tag(node, tag))
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    pub fn get_elements_by_name(&self, name: &str) -> Vec<NodeId> {
        if name.is_empty() {
            return Vec::new();
        }
        self.find_all(|node| self.attr(node, "name") == Some(name))
    }

    /// Nearest inclusive ancestor with the given tag
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_tag(node, tag) {
                return Some(node);
            }
            current = self.parent_element(node);
        }
        None
    }

    /// Form the control belongs to: its `form` attribute, else the nearest `<form>` ancestor
    pub fn form_owner(&self, id: NodeId) -> Option<NodeId> {
        if let Some(form_id) = self.attr(id, "form") {
            return self.get_element_by_id(form_id).filter(|form| self.is_tag(*form, "form"));
        }
        self.parent_element(id).and_then(|parent| self.closest(parent, "form"))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attributes.get(name).map(String::as_str)
    }

    /// Attribute value, `None` when missing or blank
    pub fn non_empty_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attr(id, name).filter(|value| !value.trim().is_empty())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn attributes(&self, id: NodeId) -> Option<&IndexMap<String, String>> {
        self.element(id).map(|element| &element.attributes)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attributes.shift_remove(name);
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_content_excluding(id, |_| false)
    }

    /// Text content with the subtrees of every descendant matching `skip` left out
    pub fn text_content_excluding(&self, id: NodeId, skip: impl Fn(NodeId) -> bool) -> String {
        if let NodeData::Text(text) = &self.nodes[id.0].data {
            return text.clone();
        }
        let mut out = String::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if skip(next) {
                continue;
            }
            match &self.nodes[next.0].data {
                NodeData::Text(text) => out.push_str(text),
                NodeData::Element(_) => stack.extend(self.children(next).iter().rev().copied()),
                _ => {}
            }
        }
        out
    }

    /// Trimmed text of the first child when that child is a text node
    pub fn direct_text(&self, id: NodeId) -> Option<String> {
        let first = *self.children(id).first()?;
        match &self.nodes[first.0].data {
            NodeData::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
            }
            _ => None,
        }
    }

    /// Serialized markup of a node and its subtree
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Document => {
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
            }
            NodeData::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|parent| self.tag(parent))
                    .is_some_and(|tag| RAW_TEXT_TAGS.contains(&tag));
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&encode_text(text));
                }
            }
            NodeData::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&element.tag.as_str()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }

    /// 1-based position among element siblings sharing the same tag
    pub fn index_of_type(&self, id: NodeId) -> usize {
        let Some(tag) = self.tag(id) else {
            return 0;
        };
        let Some(parent) = self.parent(id) else {
            return 1;
        };
        self.element_children(parent)
            .filter(|sibling| self.is_tag(*sibling, tag))
            .position(|sibling| sibling == id)
            .map_or(1, |position| position + 1)
    }

    // ------------------------------------------------------------------
    // Form control state
    // ------------------------------------------------------------------

    /// Normalized `type` of an `<input>`; unknown or missing types are `text`
    pub fn input_type(&self, id: NodeId) -> String {
        let declared = self
            .attr(id, "type")
            .map(|t| t.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if KNOWN_INPUT_TYPES.contains(&declared.as_str()) {
            declared
        } else {
            "text".to_string()
        }
    }

    /// Current value of a control, as the `value` property would report it
    pub fn value(&self, id: NodeId) -> String {
        let Some(element) = self.element(id) else {
            return String::new();
        };
        match element.tag.as_str() {
            "input" => {
                if let Some(value) = &element.dirty_value {
                    return value.clone();
                }
                match element.attributes.get("value") {
                    Some(value) => value.clone(),
                    None if matches!(self.input_type(id).as_str(), "checkbox" | "radio") => "on".to_string(),
                    None => String::new(),
                }
            }
            "textarea" => element
                .dirty_value
                .clone()
                .unwrap_or_else(|| self.text_content(id)),
            "select" => self.select_value(id),
            "option" => self.option_value(id),
            _ => element.attributes.get("value").cloned().unwrap_or_default(),
        }
    }

    /// Assign the `value` property. Returns `false` when a select has no option
    /// with that value.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> bool {
        if self.is_tag(id, "select") {
            return self.set_select_value(id, value);
        }
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        element.dirty_value = Some(value.to_string());
        self.mutations.push(DomMutation::SetValue {
            target: id,
            value: value.to_string(),
        });
        true
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id)
            .map(|element| element.dirty_checked.unwrap_or_else(|| element.attributes.contains_key("checked")))
            .unwrap_or(false)
    }

    /// Assign the `checked` property; checking a radio unchecks the rest of its group
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if checked && self.is_tag(id, "input") && self.input_type(id) == "radio" {
            for other in self.radio_group(id) {
                if other != id {
                    if let Some(element) = self.element_mut(other) {
                        element.dirty_checked = Some(false);
                    }
                }
            }
        }
        if let Some(element) = self.element_mut(id) {
            element.dirty_checked = Some(checked);
            self.mutations.push(DomMutation::SetChecked { target: id, checked });
        }
    }

    /// Radios sharing `id`'s name within the same form owner, `id` included
    pub fn radio_group(&self, id: NodeId) -> Vec<NodeId> {
        let Some(name) = self.non_empty_attr(id, "name") else {
            return vec![id];
        };
        let owner = self.form_owner(id);
        self.find_all(|node| {
            self.is_tag(node, "input")
                && self.input_type(node) == "radio"
                && self.attr(node, "name") == Some(name)
                && self.form_owner(node) == owner
        })
    }

    /// `<option>` elements of a select, optgroups flattened
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.find_descendants(select, |node| self.is_tag(node, "option"))
    }

    /// Value of an option: its `value` attribute, else its text
    pub fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(value) => value.to_string(),
            None => self.option_text(option),
        }
    }

    /// Option text with whitespace collapsed
    pub fn option_text(&self, option: NodeId) -> String {
        self.text_content(option)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Option label: its `label` attribute, else its text
    pub fn option_label(&self, option: NodeId) -> String {
        match self.non_empty_attr(option, "label") {
            Some(label) => label.to_string(),
            None => self.option_text(option),
        }
    }

    pub fn is_selected(&self, option: NodeId) -> bool {
        self.element(option)
            .map(|element| {
                element
                    .dirty_selected
                    .unwrap_or_else(|| element.attributes.contains_key("selected"))
            })
            .unwrap_or(false)
    }

    /// Value of the first selected option. A single-choice select with nothing
    /// marked selected falls back to its first enabled option.
    pub fn select_value(&self, select: NodeId) -> String {
        let options = self.options(select);
        if let Some(selected) = options.iter().find(|option| self.is_selected(**option)) {
            return self.option_value(*selected);
        }
        if self.has_attr(select, "multiple") {
            return String::new();
        }
        options
            .iter()
            .find(|option| !self.has_attr(**option, "disabled"))
            .map(|option| self.option_value(*option))
            .unwrap_or_default()
    }

    pub fn has_option_value(&self, select: NodeId, value: &str) -> bool {
        self.options(select)
            .into_iter()
            .any(|option| self.option_value(option) == value)
    }

    /// Select the first option whose value matches, deselecting the others.
    /// Nothing changes when no option matches.
    pub fn set_select_value(&mut self, select: NodeId, value: &str) -> bool {
        let options = self.options(select);
        let Some(matched) = options
            .iter()
            .copied()
            .find(|option| self.option_value(*option) == value)
        else {
            return false;
        };
        for option in options {
            if let Some(element) = self.element_mut(option) {
                element.dirty_selected = Some(option == matched);
            }
        }
        self.mutations.push(DomMutation::SelectValue {
            target: select,
            value: value.to_string(),
        });
        true
    }

    /// Whether the control is disabled, directly or through a disabled fieldset
    pub fn is_disabled(&self, id: NodeId) -> bool {
        if self.has_attr(id, "disabled") {
            return true;
        }
        match self.tag(id) {
            Some("input" | "select" | "textarea" | "button") => {
                let mut current = self.parent_element(id);
                while let Some(node) = current {
                    if self.is_tag(node, "fieldset") && self.has_attr(node, "disabled") {
                        return true;
                    }
                    current = self.parent_element(node);
                }
                false
            }
            Some("option") => self
                .parent_element(id)
                .is_some_and(|parent| self.is_tag(parent, "optgroup") && self.has_attr(parent, "disabled")),
            _ => false,
        }
    }

    pub fn is_readonly(&self, id: NodeId) -> bool {
        matches!(self.tag(id), Some("input" | "textarea")) && self.has_attr(id, "readonly")
    }

    /// Best-effort replacement for "has a layout box".
    ///
    /// Without a layout engine the decision is made from markup only: hidden
    /// inputs, non-rendered tags, the `hidden` attribute and inline
    /// `display:none` / `visibility:hidden` on the node or an ancestor.
    pub fn is_visible(&self, id: NodeId) -> bool {
        if !self.is_element(id) {
            return false;
        }
        if self.is_tag(id, "input") && self.input_type(id) == "hidden" {
            return false;
        }
        let mut current = Some(id);
        while let Some(node) = current {
            let Some(tag) = self.tag(node) else {
                break;
            };
            if NON_RENDERED_TAGS.contains(&tag) || self.has_attr(node, "hidden") {
                return false;
            }
            if let Some(style) = self.attr(node, "style") {
                let style: String = style
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_ascii_lowercase();
                if style.contains("display:none") || style.contains("visibility:hidden") {
                    return false;
                }
            }
            current = self.parent_element(node);
        }
        true
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Dispatch a bubbling, cancelable event on `target`
    pub fn dispatch(&mut self, target: NodeId, kind: EventKind) {
        log::trace!("dispatch {} on node {}", kind.as_str(), target.index());
        self.events.push(DomEvent {
            target,
            kind,
            bubbles: true,
            cancelable: true,
        });
    }

    /// Programmatic click
    pub fn click(&mut self, target: NodeId) {
        self.dispatch(target, EventKind::Click);
        self.mutations.push(DomMutation::Click { target });
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    /// Kinds of the events dispatched on `target`, in dispatch order
    pub fn events_for(&self, target: NodeId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|event| event.target == target)
            .map(|event| event.kind)
            .collect()
    }

    pub fn mutations(&self) -> &[DomMutation] {
        &self.mutations
    }

    /// Drain the mutation journal
    pub fn take_mutations(&mut self) -> Vec<DomMutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Copy live form state into attributes so that serialization shows it
    pub fn reflect_state(&mut self) {
        for id in self.descendants(self.root()) {
            let Some(element) = self.element(id) else {
                continue;
            };
            let tag = element.tag.clone();
            let dirty_value = element.dirty_value.clone();
            let selection_touched = element.dirty_selected.is_some();
            match tag.as_str() {
                "input" => {
                    let input_type = self.input_type(id);
                    if matches!(input_type.as_str(), "checkbox" | "radio") {
                        if self.checked(id) {
                            self.set_attr(id, "checked", "");
                        } else {
                            self.remove_attr(id, "checked");
                        }
                    } else if let Some(value) = dirty_value {
                        self.set_attr(id, "value", &value);
                    }
                }
                "textarea" => {
                    if let Some(value) = dirty_value {
                        for child in self.children(id).to_vec() {
                            self.detach(child);
                        }
                        self.append(id, NodeData::Text(value));
                    }
                }
                "option" => {
                    if selection_touched {
                        if self.is_selected(id) {
                            self.set_attr(id, "selected", "");
                        } else {
                            self.remove_attr(id, "selected");
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse(&format!("<html><head><title> Sign up </title></head><body>{}</body></html>", body))
    }

    #[test]
    fn test_parse_structure() {
        let doc = doc("<form id=\"f\"><input name=\"a\"><!-- note --><p>Hi</p></form>");
        let body = doc.body().unwrap();
        let form = doc.get_element_by_id("f").unwrap();

        assert!(doc.is_tag(body, "body"));
        assert_eq!(doc.parent(form), Some(body));
        assert_eq!(doc.element_children(form).count(), 2);
        assert!(doc.children(form).iter().any(|child| doc.is_comment(*child)));
        assert_eq!(doc.title(), Some("Sign up".to_string()));
    }

    #[test]
    fn test_node_id_serializes_as_index() {
        let doc = doc("<input id=\"a\">");
        let input = doc.get_element_by_id("a").unwrap();
        assert_eq!(serde_json::to_value(input).unwrap(), serde_json::json!(input.index()));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = doc("<div id=\"a\"><span id=\"b\"><i id=\"c\"></i></span><b id=\"d\"></b></div>");
        let a = doc.get_element_by_id("a").unwrap();
        let ids: Vec<_> = doc
            .descendants(a)
            .into_iter()
            .filter_map(|node| doc.attr(node, "id"))
            .collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_text_helpers() {
        let doc = doc("<label id=\"l\">  Email <input id=\"e\" value=\"x\"> <em>required</em></label>");
        let label = doc.get_element_by_id("l").unwrap();

        assert_eq!(doc.direct_text(label), Some("Email".to_string()));
        assert!(doc.text_content(label).contains("required"));
        let without_em = doc.text_content_excluding(label, |node| doc.is_tag(node, "em"));
        assert_eq!(without_em.trim(), "Email");
    }

    #[test]
    fn test_input_value_semantics() {
        let mut doc = doc("<input id=\"t\" value=\"old\"><input id=\"c\" type=\"checkbox\"><textarea id=\"ta\">body</textarea>");
        let text = doc.get_element_by_id("t").unwrap();
        let checkbox = doc.get_element_by_id("c").unwrap();
        let textarea = doc.get_element_by_id("ta").unwrap();

        assert_eq!(doc.value(text), "old");
        assert_eq!(doc.value(checkbox), "on");
        assert_eq!(doc.value(textarea), "body");

        assert!(doc.set_value(text, "new"));
        assert_eq!(doc.value(text), "new");
        assert_eq!(doc.attr(text, "value"), Some("old"));
        assert_eq!(doc.mutations().len(), 1);
    }

    #[test]
    fn test_unknown_input_type_is_text() {
        let doc = doc("<input id=\"a\" type=\"EMAIL\"><input id=\"b\" type=\"fancy\"><input id=\"c\">");
        assert_eq!(doc.input_type(doc.get_element_by_id("a").unwrap()), "email");
        assert_eq!(doc.input_type(doc.get_element_by_id("b").unwrap()), "text");
        assert_eq!(doc.input_type(doc.get_element_by_id("c").unwrap()), "text");
    }

    #[test]
    fn test_radio_group_exclusive() {
        let mut doc = doc(
            "<form><input type=\"radio\" name=\"size\" id=\"s\" value=\"s\" checked>\
             <input type=\"radio\" name=\"size\" id=\"m\" value=\"m\"></form>\
             <input type=\"radio\" name=\"size\" id=\"other\" checked>",
        );
        let small = doc.get_element_by_id("s").unwrap();
        let medium = doc.get_element_by_id("m").unwrap();
        let other = doc.get_element_by_id("other").unwrap();

        assert_eq!(doc.radio_group(small), vec![small, medium]);
        doc.set_checked(medium, true);
        assert!(doc.checked(medium));
        assert!(!doc.checked(small));
        assert!(doc.checked(other));
    }

    #[test]
    fn test_select_value() {
        let mut doc = doc(
            "<select id=\"s\"><option value=\"a\">A</option><optgroup><option selected>  B   b </option></optgroup></select>\
             <select id=\"d\"><option disabled value=\"x\">X</option><option value=\"y\">Y</option></select>",
        );
        let select = doc.get_element_by_id("s").unwrap();
        let fallback = doc.get_element_by_id("d").unwrap();

        assert_eq!(doc.options(select).len(), 2);
        assert_eq!(doc.value(select), "B b");
        assert_eq!(doc.value(fallback), "y");

        assert!(!doc.set_select_value(select, "zzz"));
        assert_eq!(doc.value(select), "B b");
        assert!(doc.set_value(select, "a"));
        assert_eq!(doc.value(select), "a");
    }

    #[test]
    fn test_disabled_through_fieldset() {
        let doc = doc("<fieldset disabled><input id=\"a\"></fieldset><input id=\"b\" readonly>");
        assert!(doc.is_disabled(doc.get_element_by_id("a").unwrap()));
        let b = doc.get_element_by_id("b").unwrap();
        assert!(!doc.is_disabled(b));
        assert!(doc.is_readonly(b));
    }

    #[test]
    fn test_visibility_heuristics() {
        let doc = doc(
            "<div id=\"v\"></div><div style=\"display: none\"><span id=\"n\"></span></div>\
             <p id=\"h\" hidden></p><input id=\"hi\" type=\"hidden\">",
        );
        assert!(doc.is_visible(doc.get_element_by_id("v").unwrap()));
        assert!(!doc.is_visible(doc.get_element_by_id("n").unwrap()));
        assert!(!doc.is_visible(doc.get_element_by_id("h").unwrap()));
        assert!(!doc.is_visible(doc.get_element_by_id("hi").unwrap()));
    }

    #[test]
    fn test_outer_html() {
        let doc = doc("<p id=\"p\" title='a \"b\"'>x &lt; y<br><!--c--></p>");
        let p = doc.get_element_by_id("p").unwrap();
        assert_eq!(
            doc.outer_html(p),
            "<p id=\"p\" title=\"a &quot;b&quot;\">x &lt; y<br><!--c--></p>"
        );
    }

    #[test]
    fn test_events_and_click() {
        let mut doc = doc("<button id=\"b\">Go</button>");
        let button = doc.get_element_by_id("b").unwrap();
        doc.dispatch(button, EventKind::Input);
        doc.click(button);

        assert_eq!(doc.events_for(button), vec![EventKind::Input, EventKind::Click]);
        assert!(doc.events().iter().all(|event| event.bubbles && event.cancelable));
        assert_eq!(doc.take_mutations(), vec![DomMutation::Click { target: button }]);
        assert!(doc.mutations().is_empty());
    }

    #[test]
    fn test_reflect_state() {
        let mut doc = doc("<input id=\"t\"><input id=\"c\" type=\"checkbox\"><textarea id=\"ta\"></textarea>");
        let text = doc.get_element_by_id("t").unwrap();
        let checkbox = doc.get_element_by_id("c").unwrap();
        let textarea = doc.get_element_by_id("ta").unwrap();

        doc.set_value(text, "hello");
        doc.set_checked(checkbox, true);
        doc.set_value(textarea, "notes");
        doc.reflect_state();

        assert_eq!(doc.attr(text, "value"), Some("hello"));
        assert!(doc.has_attr(checkbox, "checked"));
        assert_eq!(doc.outer_html(textarea), "<textarea id=\"ta\">notes</textarea>");
    }

    #[test]
    fn test_index_of_type() {
        let doc = doc("<div><span id=\"a\"></span><p></p><span id=\"b\"></span></div>");
        assert_eq!(doc.index_of_type(doc.get_element_by_id("a").unwrap()), 1);
        assert_eq!(doc.index_of_type(doc.get_element_by_id("b").unwrap()), 2);
    }
}
