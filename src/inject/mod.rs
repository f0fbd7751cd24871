//! Field injection: applying a model's field list to a live document.
//!
//! Every field is handled on its own. A field that cannot be located or
//! written is counted as skipped with a warning, and processing moves on to
//! the next one.

pub mod locate;
pub mod write;

pub use locate::{default_locators, Locator};
pub use write::{checkbox_intent, write_field};

use crate::dom::document::{Document, NodeId};
use crate::error::{AutofillError, Result};
use crate::mapping::{FieldStatus, MappedField};
use crate::page::Page;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why one field was not filled. The display text is what ends up in
/// [`InjectionOutcome::warnings`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldWarning {
    #[error("Could not find element for {0}.")]
    NotFound(String),

    #[error("No value provided by AI for {0}.")]
    MissingValue(String),

    #[error("AI reported an error for {0}.")]
    ModelError(String),

    #[error("Element for {0} is disabled.")]
    Disabled(String),

    #[error("Element for {0} is read-only.")]
    ReadOnly(String),

    #[error("File inputs cannot be filled: {0}.")]
    FileInput(String),

    #[error("Option \"{option}\" does not exist for {field}.")]
    MissingOption { field: String, option: String },

    #[error("No radio button with value \"{value}\" in group \"{name}\" for {field}.")]
    MissingRadio { field: String, name: String, value: String },

    #[error("{count} elements share the name \"{name}\" for {field}; none was filled.")]
    Ambiguous { field: String, name: String, count: usize },

    #[error("Cannot fill <{tag}> element for {field}.")]
    Unsupported { field: String, tag: String },

    #[error("Button for {0} is still waiting for user input.")]
    Waiting(String),

    #[error("No click requested for {0}.")]
    NoClickIntent(String),

    #[error("Error processing {field}: {reason}")]
    Processing { field: String, reason: String },
}

/// Counts and warnings of one injection run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionOutcome {
    pub fields_processed: usize,
    pub fields_filled_successfully: usize,
    pub fields_skipped: usize,
    pub warnings: Vec<String>,
}

impl InjectionOutcome {
    /// `Form Filling: Processed: N, Filled: M, Skipped/Errors: K`
    pub fn summary(&self) -> String {
        format!(
            "Form Filling: Processed: {}, Filled: {}, Skipped/Errors: {}",
            self.fields_processed, self.fields_filled_successfully, self.fields_skipped
        )
    }

    /// Whether every processed field was filled
    pub fn is_complete(&self) -> bool {
        self.fields_skipped == 0
    }

    fn filled(&mut self) {
        self.fields_filled_successfully += 1;
    }

    fn skipped(&mut self, warning: FieldWarning) {
        log::warn!("{}", warning);
        self.fields_skipped += 1;
        self.warnings.push(warning.to_string());
    }
}

/// Locates and fills mapped fields in a [`Document`]
#[derive(Clone)]
pub struct FieldInjector {
    locators: Vec<(&'static str, Locator)>,
}

impl std::fmt::Debug for FieldInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldInjector").field("locators", &self.locator_names()).finish()
    }
}

impl Default for FieldInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldInjector {
    /// Create an injector with the standard lookup cascade
    pub fn new() -> Self {
        Self {
            locators: default_locators(),
        }
    }

    /// Create an injector with a custom lookup cascade
    pub fn with_locators(locators: Vec<(&'static str, Locator)>) -> Self {
        Self { locators }
    }

    pub fn locator_names(&self) -> Vec<&'static str> {
        self.locators.iter().map(|(name, _)| *name).collect()
    }

    /// First element any locator finds for `field`
    pub fn locate(&self, document: &Document, field: &MappedField) -> std::result::Result<Option<NodeId>, FieldWarning> {
        locate::check_identifiers(field)?;
        for (name, locator) in &self.locators {
            if let Some(node) = locator(document, field)? {
                log::debug!("Located {} by {}", field.identifier(), name);
                return Ok(Some(node));
            }
        }
        // A shared name is only an error once nothing else pinned the element down
        match locate::name_ambiguity(document, field) {
            Some(warning) => Err(warning),
            None => Ok(None),
        }
    }

    /// Apply every field in order and report what happened
    pub fn inject(&self, document: &mut Document, fields: &[MappedField]) -> InjectionOutcome {
        let mut outcome = InjectionOutcome::default();

        for field in fields {
            outcome.fields_processed += 1;
            match self.inject_one(document, field) {
                Ok(()) => outcome.filled(),
                Err(warning) => outcome.skipped(warning),
            }
        }

        log::info!("{}", outcome.summary());
        outcome
    }

    fn inject_one(&self, document: &mut Document, field: &MappedField) -> std::result::Result<(), FieldWarning> {
        if field.status == FieldStatus::Error {
            return Err(FieldWarning::ModelError(field.identifier()));
        }
        if !write::has_intent(field) {
            return Err(FieldWarning::MissingValue(field.identifier()));
        }
        let node = self
            .locate(document, field)?
            .ok_or_else(|| FieldWarning::NotFound(field.identifier()))?;
        write_field(document, node, field)
    }
}

/// Inject into the page currently open, if there is one
pub fn inject_into(page: Option<&mut Page>, fields: &[MappedField]) -> Result<InjectionOutcome> {
    let page = page.ok_or_else(|| AutofillError::InjectionInfrastructure("no page is open".to_string()))?;
    Ok(FieldInjector::new().inject(page.document_mut(), fields))
}
