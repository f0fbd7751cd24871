//! # form-autofill
//!
//! Fill web forms from freeform instructions with the help of a language model.
//!
//! ## Features
//!
//! - **Structural extraction**: walk a page into a JSON tree of form-relevant
//!   elements, each with its resolved human-readable label
//! - **Mapping requests**: package that tree with the user's instructions for
//!   any OpenAI-compatible chat endpoint
//! - **Field injection**: find every field the model answered for and write its
//!   value the way a user would, firing `input`/`change`/`blur`
//! - **Browser binding**: capture a live Chrome tab and replay the changes into
//!   it over the DevTools protocol
//!
//! ## Library Usage
//!
//! ### Offline: HTML in, filled HTML out
//!
//! ```rust
//! use form_autofill::{inject_into, MappedField, Page};
//!
//! # fn main() -> form_autofill::Result<()> {
//! let mut page = Page::from_html(
//!     "https://example.com/signup",
//!     r#"<form><label for="email">Email</label><input id="email" type="email"></form>"#,
//! );
//!
//! let fields = vec![MappedField::new("email").with_label("Email").with_value("ada@example.com")];
//! let outcome = inject_into(Some(&mut page), &fields)?;
//!
//! assert_eq!(outcome.fields_filled_successfully, 1);
//! println!("{}", outcome.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ### With a model
//!
//! ```rust,no_run
//! use form_autofill::{ExtractionSession, FieldMapper, MapperConfig, MappingRequest, OpenAiMapper, Page};
//!
//! # async fn run(mut page: Page) -> form_autofill::Result<()> {
//! let mut session = ExtractionSession::new();
//! let snapshot = session.extract(&page)?;
//!
//! let request = MappingRequest::from_snapshot(&snapshot, "I'm Ada Lovelace, ada@example.com")?;
//! let mapper = OpenAiMapper::new(MapperConfig::default())?;
//! let response = mapper.map_fields(&request).await?;
//!
//! let outcome = form_autofill::inject_into(Some(&mut page), &response.fields)?;
//! println!("{}", outcome.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ### Using the Tool System
//!
//! ```rust
//! use form_autofill::{ExtractionSession, Page};
//! use form_autofill::tools::{ToolContext, ToolRegistry};
//! use serde_json::json;
//!
//! # fn main() -> form_autofill::Result<()> {
//! let mut page = Page::from_html("about:blank", r#"<input name="city">"#);
//! let mut session = ExtractionSession::new();
//! let mut context = ToolContext::new(&mut page, &mut session);
//!
//! let registry = ToolRegistry::with_defaults();
//! let result = registry.execute(
//!     "inject_fields",
//!     json!({"fields": [{"type": "text", "name": "city", "value": "Lyon"}]}),
//!     &mut context,
//! )?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod dom;
pub mod error;
pub mod inject;
pub mod mapping;
pub mod page;
pub mod tools;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use dom::{extract_fields, extract_page_structure, Document, ElementRecord, ExtractOptions, PageSnapshot};
pub use error::{AutofillError, Result};
pub use inject::{inject_into, FieldInjector, FieldWarning, InjectionOutcome};
pub use mapping::{FieldMapper, MappedField, MapperConfig, MappingRequest, MappingResponse, OpenAiMapper};
pub use page::{ExtractionOutcome, ExtractionSession, Page};
pub use tools::{Tool, ToolContext, ToolRegistry, ToolResult};
