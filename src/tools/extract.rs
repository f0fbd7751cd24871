use crate::error::{AutofillError, Result};
use crate::page::ExtractionOutcome;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExtractStructureParams {
    /// Walk the page again instead of returning the cached snapshot (default: false)
    #[serde(default)]
    pub refresh: bool,
}

/// Tool returning the page's structural snapshot
#[derive(Default)]
pub struct ExtractStructureTool;

impl Tool for ExtractStructureTool {
    type Params = ExtractStructureParams;

    fn name(&self) -> &str {
        "extract_structure"
    }

    fn execute_typed(&self, params: ExtractStructureParams, context: &mut ToolContext) -> Result<ToolResult> {
        if params.refresh {
            context.session.reset();
        }

        match context.session.run(&*context.page) {
            ExtractionOutcome::Snapshot(snapshot) => {
                let data = serde_json::to_value(&*snapshot).map_err(|e| AutofillError::Extraction(e.to_string()))?;
                Ok(ToolResult::success_with(data))
            }
            ExtractionOutcome::Error { error } => Ok(ToolResult::failure(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{ExtractionSession, Page};

    #[test]
    fn test_extract_structure_tool() {
        let mut page = Page::from_html("https://example.com/signup", "<form><input id=\"email\" type=\"email\"></form>");
        let mut session = ExtractionSession::new();
        let mut context = ToolContext::new(&mut page, &mut session);

        let tool = ExtractStructureTool;
        let result = tool.execute_typed(ExtractStructureParams::default(), &mut context).unwrap();
        assert!(result.success);

        let data = result.data.unwrap();
        assert_eq!(data["url"], "https://example.com/signup");
        assert_eq!(data["formStructure"][0]["elementType"], "FormElement");
        assert!(session.has_run());
    }

    #[test]
    fn test_refresh_clears_cache() {
        let mut page = Page::from_html("about:blank", "<input id=\"a\">");
        let mut session = ExtractionSession::new();
        let first = session.extract(&page).unwrap();

        let mut context = ToolContext::new(&mut page, &mut session);
        ExtractStructureTool
            .execute_typed(ExtractStructureParams { refresh: true }, &mut context)
            .unwrap();
        assert!(!std::sync::Arc::ptr_eq(&first, session.cached().unwrap()));
    }

    #[test]
    fn test_extract_structure_params_schema() {
        let tool = ExtractStructureTool;
        assert_eq!(tool.name(), "extract_structure");
        assert!(tool.parameters_schema().is_object());
    }
}
