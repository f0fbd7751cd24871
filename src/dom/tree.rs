use crate::dom::document::{Document, NodeData, NodeId};
use crate::dom::element::{
    truncate_option_html, truncate_outer_html, BaseAttributes, ButtonFields, ElementKind, ElementRecord,
    FieldSetFields, FormFields, GenericFields, InputFields, LabelFields, OptionRecord, SelectFields,
    TextAreaFields,
};
use crate::dom::label::LabelResolver;
use crate::error::{AutofillError, Result};
use crate::page::Page;
use serde::{Deserialize, Serialize};

/// Deepest level captured below the body; deeper nodes are omitted
pub const MAX_DEPTH: usize = 15;

/// Tags that are never captured
const SKIPPED_TAGS: [&str; 6] = ["script", "style", "meta", "link", "noscript", "template"];

/// Tags whose children are walked
const CONTAINER_TAGS: [&str; 21] = [
    "form", "fieldset", "div", "span", "ul", "ol", "li", "table", "thead", "tbody", "tfoot", "tr", "td", "th",
    "section", "article", "aside", "nav", "header", "footer", "main",
];

const BUTTON_TYPES: [&str; 3] = ["submit", "reset", "button"];

/// Options for a structural extraction run
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Deepest level captured, top-level body children being level 0
    pub max_depth: usize,

    /// Capture the (capped) outer markup of every node
    pub include_raw_html: bool,

    /// Label cascade attached to inputs, selects and textareas
    pub resolver: LabelResolver,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            include_raw_html: true,
            resolver: LabelResolver::live(),
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the depth bound
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builder method: toggle raw markup capture
    pub fn include_raw_html(mut self, include: bool) -> Self {
        self.include_raw_html = include;
        self
    }

    /// Builder method: replace the label cascade
    pub fn resolver(mut self, resolver: LabelResolver) -> Self {
        self.resolver = resolver;
        self
    }
}

/// Serializable result of one extraction: page metadata plus the element tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Capture instant in epoch milliseconds
    pub timestamp: String,

    /// Top-level records, one per surviving child of the body
    pub form_structure: Vec<ElementRecord>,
}

impl PageSnapshot {
    /// Inputs, textareas, selects and buttons in document order
    pub fn controls(&self) -> Vec<&ElementRecord> {
        let mut controls = Vec::new();
        for record in &self.form_structure {
            record.walk(&mut |r| {
                if r.kind.is_control() {
                    controls.push(r);
                }
            });
        }
        controls
    }

    pub fn find_by_id(&self, id: &str) -> Option<&ElementRecord> {
        self.form_structure.iter().find_map(|record| record.find_by_id(id))
    }

    /// Levels in the deepest branch
    pub fn depth(&self) -> usize {
        self.form_structure.iter().map(ElementRecord::depth).max().unwrap_or(0)
    }

    /// Convert the snapshot to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AutofillError::Extraction(format!("Failed to serialize snapshot: {}", e)))
    }
}

/// Walk the page body and capture its form-relevant structure.
///
/// Fails only when the page has no body to walk; problems with individual
/// nodes drop those nodes.
pub fn extract_page_structure(page: &Page, options: &ExtractOptions) -> Result<PageSnapshot> {
    let document = page.document();
    let body = document
        .body()
        .ok_or_else(|| AutofillError::Extraction("document has no body".to_string()))?;

    let extractor = StructureExtractor { document, options };
    let form_structure: Vec<ElementRecord> = document
        .element_children(body)
        .filter_map(|child| extractor.extract(child, 0))
        .collect();

    log::debug!(
        "Extracted {} top-level records from {}",
        form_structure.len(),
        page.url()
    );

    Ok(PageSnapshot {
        url: page.url().to_string(),
        title: document.title(),
        timestamp: chrono::Utc::now().timestamp_millis().to_string(),
        form_structure,
    })
}

struct StructureExtractor<'a> {
    document: &'a Document,
    options: &'a ExtractOptions,
}

impl StructureExtractor<'_> {
    fn extract(&self, node: NodeId, depth: usize) -> Option<ElementRecord> {
        let document = self.document;
        let tag = document.tag(node)?;

        if depth > self.options.max_depth {
            log::warn!("Max depth reached for element <{}> at depth {}", tag, depth);
            return None;
        }
        if SKIPPED_TAGS.contains(&tag) {
            return None;
        }

        let mut base = self.base_attributes(node);
        let kind = match tag {
            "input" => ElementKind::Input(self.input_fields(node)),
            "select" => ElementKind::Select(self.select_fields(node)),
            "textarea" => ElementKind::TextArea(self.textarea_fields(node)),
            "button" => ElementKind::Button(self.button_fields(node)),
            "label" => ElementKind::Label(LabelFields {
                for_field: document.non_empty_attr(node, "for").map(str::to_string),
                text: trimmed(document.text_content(node)),
            }),
            "form" => ElementKind::Form(FormFields {
                action: document.non_empty_attr(node, "action").map(str::to_string),
                method: Some(form_method(document, node)),
                target: document.non_empty_attr(node, "target").map(str::to_string),
            }),
            "fieldset" => ElementKind::FieldSet(FieldSetFields {
                disabled: document.has_attr(node, "disabled"),
            }),
            _ => {
                let meaningful = base.is_visible
                    || base.id.is_some()
                    || base.class_name.is_some()
                    || document.has_attr(node, "role");
                if !meaningful {
                    return None;
                }
                ElementKind::Generic(GenericFields {
                    text: generic_text(document, node),
                })
            }
        };

        if matches!(kind, ElementKind::Input(_) | ElementKind::Select(_) | ElementKind::TextArea(_)) {
            let label = self.options.resolver.resolve(document, node);
            if !label.is_empty() {
                base.label = Some(label);
            }
        }

        let mut record = ElementRecord::new(tag, base, kind);
        if CONTAINER_TAGS.contains(&tag) {
            record.children = document
                .element_children(node)
                .filter_map(|child| self.extract(child, depth + 1))
                .collect();
        }
        Some(record)
    }

    fn base_attributes(&self, node: NodeId) -> BaseAttributes {
        let document = self.document;
        let owned = |name: &str| {
            document
                .attr(node, name)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        BaseAttributes {
            id: owned("id"),
            class_name: owned("class"),
            name: owned("name"),
            data_test_id: owned("data-testid"),
            aria_label: owned("aria-label"),
            aria_labelled_by: owned("aria-labelledby"),
            aria_described_by: owned("aria-describedby"),
            is_visible: document.is_visible(node),
            text_content: document.direct_text(node),
            raw_outer_html: self
                .options
                .include_raw_html
                .then(|| truncate_outer_html(&document.outer_html(node))),
            label: None,
        }
    }

    fn input_fields(&self, node: NodeId) -> InputFields {
        let document = self.document;
        let input_type = document.input_type(node);
        let checkable = matches!(input_type.as_str(), "checkbox" | "radio");

        InputFields {
            value: document.value(node),
            placeholder: document.non_empty_attr(node, "placeholder").map(str::to_string),
            required: document.has_attr(node, "required"),
            disabled: document.is_disabled(node),
            checked: checkable.then(|| document.checked(node)),
            pattern: document.non_empty_attr(node, "pattern").map(str::to_string),
            min_length: length_limit(document, node, "minlength"),
            max_length: length_limit(document, node, "maxlength"),
            input_type,
        }
    }

    fn select_fields(&self, node: NodeId) -> SelectFields {
        let document = self.document;
        let selected_value = document.value(node);
        let options = document
            .options(node)
            .into_iter()
            .enumerate()
            .map(|(index, option)| {
                let mut base = self.base_attributes(option);
                base.raw_outer_html = self
                    .options
                    .include_raw_html
                    .then(|| truncate_option_html(&document.outer_html(option)));
                OptionRecord {
                    tag: "option".to_string(),
                    base,
                    value: document.option_value(option),
                    text: document.option_text(option),
                    selected: document.is_selected(option),
                    disabled: document.is_disabled(option),
                    index,
                }
            })
            .collect();

        SelectFields {
            value: selected_value,
            multiple: document.has_attr(node, "multiple"),
            disabled: document.is_disabled(node),
            required: document.has_attr(node, "required"),
            options,
        }
    }

    fn textarea_fields(&self, node: NodeId) -> TextAreaFields {
        let document = self.document;
        TextAreaFields {
            value: document.value(node),
            placeholder: document.non_empty_attr(node, "placeholder").map(str::to_string),
            required: document.has_attr(node, "required"),
            disabled: document.is_disabled(node),
            rows: positive_dimension(document, node, "rows", 2),
            cols: positive_dimension(document, node, "cols", 20),
            min_length: length_limit(document, node, "minlength"),
            max_length: length_limit(document, node, "maxlength"),
        }
    }

    fn button_fields(&self, node: NodeId) -> ButtonFields {
        let document = self.document;
        let button_type = document
            .attr(node, "type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| BUTTON_TYPES.contains(&t.as_str()))
            .unwrap_or_else(|| "submit".to_string());

        ButtonFields {
            button_type,
            text: trimmed(document.text_content(node))
                .or_else(|| document.non_empty_attr(node, "value").map(str::to_string)),
            disabled: document.is_disabled(node),
        }
    }
}

fn trimmed(text: String) -> Option<String> {
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

/// Direct text when the first child is text, otherwise the whole subtree text
fn generic_text(document: &Document, node: NodeId) -> Option<String> {
    let first_is_text = document
        .children(node)
        .first()
        .is_some_and(|first| matches!(document.data(*first), NodeData::Text(_)));
    if first_is_text {
        document.direct_text(node)
    } else {
        trimmed(document.text_content(node))
    }
}

/// `minlength`/`maxlength`; a missing or invalid attribute means no limit
fn length_limit(document: &Document, node: NodeId, name: &str) -> Option<u32> {
    document.attr(node, name)?.trim().parse().ok()
}

fn positive_dimension(document: &Document, node: NodeId, name: &str, default: u32) -> u32 {
    document
        .attr(node, name)
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn form_method(document: &Document, node: NodeId) -> String {
    match document.attr(node, "method").map(|m| m.trim().to_ascii_lowercase()) {
        Some(method) if method == "post" || method == "dialog" => method,
        _ => "get".to_string(),
    }
}
