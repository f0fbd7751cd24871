use crate::error::{AutofillError, Result};
use crate::inject::inject_into;
use crate::mapping::MappedField;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InjectFieldsParams {
    /// Field list returned by the mapping step
    #[serde(alias = "formStructure")]
    pub fields: Vec<MappedField>,
}

/// Tool writing mapped values into the current page
#[derive(Default)]
pub struct InjectFieldsTool;

impl Tool for InjectFieldsTool {
    type Params = InjectFieldsParams;

    fn name(&self) -> &str {
        "inject_fields"
    }

    fn execute_typed(&self, params: InjectFieldsParams, context: &mut ToolContext) -> Result<ToolResult> {
        let outcome = inject_into(Some(&mut *context.page), &params.fields)?;
        // Values changed, so the cached snapshot no longer describes the page
        context.session.reset();

        let mut data = serde_json::to_value(&outcome).map_err(|e| AutofillError::ToolExecutionFailed {
            tool: "inject_fields".to_string(),
            reason: e.to_string(),
        })?;
        data["summary"] = serde_json::Value::String(outcome.summary());
        Ok(ToolResult::success_with(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{ExtractionSession, Page};
    use serde_json::json;

    #[test]
    fn test_inject_fields_tool() {
        let mut page = Page::from_html(
            "about:blank",
            "<form><input id=\"email\"><input type=\"checkbox\" name=\"terms\" id=\"terms\"></form>",
        );
        let mut session = ExtractionSession::new();
        session.extract(&page).unwrap();

        let params: InjectFieldsParams = serde_json::from_value(json!({
            "formStructure": [
                {"type": "email", "id": "email", "value": "a@b.com"},
                {"type": "checkbox", "name": "terms", "value": "yes"},
                {"type": "text", "id": "missing", "value": "x"}
            ]
        }))
        .unwrap();

        let mut context = ToolContext::new(&mut page, &mut session);
        let data = InjectFieldsTool.execute_typed(params, &mut context).unwrap().data.unwrap();

        assert_eq!(data["fieldsProcessed"], 3);
        assert_eq!(data["fieldsFilledSuccessfully"], 2);
        assert_eq!(data["fieldsSkipped"], 1);
        assert_eq!(data["summary"], "Form Filling: Processed: 3, Filled: 2, Skipped/Errors: 1");
        assert!(!session.has_run());

        let terms = page.document().get_element_by_id("terms").unwrap();
        assert!(page.document().checked(terms));
    }
}
