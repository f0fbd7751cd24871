//! Typed entry points behind a name-keyed registry.
//!
//! Each tool takes JSON parameters, works on the [`Page`] held by a
//! [`ToolContext`] and answers with a [`ToolResult`].

pub mod extract;
pub mod fields;
pub mod inject;

pub use extract::{ExtractStructureParams, ExtractStructureTool};
pub use fields::{BuildRequestParams, BuildRequestTool, ExtractFieldsParams, ExtractFieldsTool};
pub use inject::{InjectFieldsParams, InjectFieldsTool};

use crate::error::{AutofillError, Result};
use crate::page::{ExtractionSession, Page};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page and extraction cache a tool runs against
pub struct ToolContext<'a> {
    pub page: &'a mut Page,
    pub session: &'a mut ExtractionSession,
}

impl<'a> ToolContext<'a> {
    pub fn new(page: &'a mut Page, session: &'a mut ExtractionSession) -> Self {
        Self { page, session }
    }
}

/// Result of a tool call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Successful result without data
    pub fn success() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// Successful result carrying `data`
    pub fn success_with(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed result with an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// A tool with typed parameters
pub trait Tool: Send + Sync {
    type Params: DeserializeOwned + JsonSchema;

    fn name(&self) -> &str;

    fn execute_typed(&self, params: Self::Params, context: &mut ToolContext) -> Result<ToolResult>;

    /// JSON schema of [`Tool::Params`]
    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schemars::schema_for!(Self::Params)).unwrap_or_default()
    }
}

/// Object-safe view of a [`Tool`], taking raw JSON parameters
pub trait DynTool: Send + Sync {
    fn name(&self) -> &str;

    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult>;

    fn parameters_schema(&self) -> Value;
}

impl<T: Tool> DynTool for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn execute(&self, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let params: T::Params = serde_json::from_value(params).map_err(|e| AutofillError::InvalidParams {
            tool: Tool::name(self).to_string(),
            reason: e.to_string(),
        })?;
        self.execute_typed(params, context)
    }

    fn parameters_schema(&self) -> Value {
        Tool::parameters_schema(self)
    }
}

/// Registry of tools by name, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Box<dyn DynTool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ExtractStructureTool);
        registry.register(ExtractFieldsTool);
        registry.register(BuildRequestTool);
        registry.register(InjectFieldsTool);
        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(Tool::name(&tool).to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynTool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub fn execute(&self, name: &str, params: Value, context: &mut ToolContext) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AutofillError::ToolNotFound(name.to_string()))?;
        log::debug!("Executing tool {}", name);
        tool.execute(params, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_defaults() {
        let registry = ToolRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            vec!["extract_structure", "extract_fields", "build_mapping_request", "inject_fields"]
        );
        for name in registry.names() {
            assert!(registry.get(name).unwrap().parameters_schema().is_object());
        }
    }

    #[test]
    fn test_unknown_tool() {
        let mut page = Page::from_html("about:blank", "<p>hi</p>");
        let mut session = ExtractionSession::new();
        let mut context = ToolContext::new(&mut page, &mut session);

        let err = ToolRegistry::with_defaults()
            .execute("screenshot", json!({}), &mut context)
            .unwrap_err();
        assert!(matches!(err, AutofillError::ToolNotFound(_)));
    }

    #[test]
    fn test_invalid_params() {
        let mut page = Page::from_html("about:blank", "<input id=\"a\">");
        let mut session = ExtractionSession::new();
        let mut context = ToolContext::new(&mut page, &mut session);

        let err = ToolRegistry::with_defaults()
            .execute("inject_fields", json!({"fields": "nope"}), &mut context)
            .unwrap_err();
        assert!(matches!(err, AutofillError::InvalidParams { ref tool, .. } if tool == "inject_fields"));
    }

    #[test]
    fn test_tool_result_serialization() {
        let value = serde_json::to_value(ToolResult::failure("boom")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "boom"}));

        let value = serde_json::to_value(ToolResult::success()).unwrap();
        assert_eq!(value, json!({"success": true}));
    }
}
