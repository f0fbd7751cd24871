//! Host page context and the caller-owned extraction cache.

use crate::dom::document::Document;
use crate::dom::tree::{extract_page_structure, ExtractOptions, PageSnapshot};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// A page to extract from and inject into
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    document: Document,
}

impl Page {
    pub fn new(url: impl Into<String>, document: Document) -> Self {
        Self {
            url: url.into(),
            document,
        }
    }

    /// Parse `html` into a page located at `url`
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        Self::new(url, Document::parse(html))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> Option<String> {
        self.document.title()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Serialize the page with its current form state written back into the markup
    pub fn to_html(&self) -> String {
        let mut document = self.document.clone();
        document.reflect_state();
        format!("<!DOCTYPE html>{}", document.outer_html(document.root()))
    }
}

/// What the extraction entry point hands back: a snapshot, or the reason there is none
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExtractionOutcome {
    Snapshot(Arc<PageSnapshot>),
    Error { error: String },
}

impl ExtractionOutcome {
    pub fn snapshot(&self) -> Option<&Arc<PageSnapshot>> {
        match self {
            ExtractionOutcome::Snapshot(snapshot) => Some(snapshot),
            ExtractionOutcome::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExtractionOutcome::Error { .. })
    }
}

/// Remembers the first snapshot taken in a page context so repeat runs
/// return it instead of walking the DOM again
#[derive(Debug, Default)]
pub struct ExtractionSession {
    options: ExtractOptions,
    cached: Option<Arc<PageSnapshot>>,
}

impl ExtractionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options, cached: None }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Snapshot of `page`, taken on the first call and shared afterwards
    pub fn extract(&mut self, page: &Page) -> Result<Arc<PageSnapshot>> {
        if let Some(snapshot) = &self.cached {
            log::debug!("Structure extractor already ran, returning previous result");
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(extract_page_structure(page, &self.options)?);
        self.cached = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Like [`extract`](Self::extract) but never fails: errors come back as
    /// `{ "error": "Extraction failed: ..." }`
    pub fn run(&mut self, page: &Page) -> ExtractionOutcome {
        match self.extract(page) {
            Ok(snapshot) => ExtractionOutcome::Snapshot(snapshot),
            Err(e) => {
                log::error!("Error in structure extractor: {}", e);
                ExtractionOutcome::Error { error: e.to_string() }
            }
        }
    }

    pub fn has_run(&self) -> bool {
        self.cached.is_some()
    }

    pub fn cached(&self) -> Option<&Arc<PageSnapshot>> {
        self.cached.as_ref()
    }

    /// Forget the cached snapshot, e.g. after navigating
    pub fn reset(&mut self) {
        self.cached = None;
    }
}
