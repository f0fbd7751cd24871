//! DOM model, structural extraction and label resolution
//!
//! This module provides functionality for capturing the form-relevant structure
//! of a page. It includes:
//! - Document: Mutable arena DOM with browser-like form control state
//! - ElementRecord: Typed capture of one form-relevant node
//! - LabelResolver: Ordered label strategies for form controls
//! - PageSnapshot: Bounded-depth element tree plus page metadata
//! - FieldDescriptor: Flat field listing for serialized HTML
//! - SelectorMap: CSS selectors for replaying changes in a browser tab

pub mod document;
pub mod element;
pub mod fields;
pub mod label;
pub mod selector_map;
pub mod tree;

pub use document::{Document, DomEvent, DomMutation, EventKind, NodeId};
pub use element::{BaseAttributes, ElementKind, ElementRecord, OptionRecord};
pub use fields::{extract_fields, extract_fields_from, FieldDescriptor, OptionDescriptor};
pub use label::{LabelResolver, LabelStrategy};
pub use selector_map::{ElementSelector, SelectorMap};
pub use tree::{extract_page_structure, ExtractOptions, PageSnapshot, MAX_DEPTH};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_export() {
        let document = Document::parse("<p>hi</p>");
        assert!(document.body().is_some());
    }

    #[test]
    fn test_selector_map_export() {
        let map = SelectorMap::new();
        assert!(map.is_empty());
    }

    #[test]
    fn test_resolver_export() {
        assert_eq!(LabelResolver::detached().names().len(), 2);
    }
}
