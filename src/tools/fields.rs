use crate::dom::fields::{extract_fields, extract_fields_from};
use crate::error::{AutofillError, Result};
use crate::mapping::MappingRequest;
use crate::tools::{Tool, ToolContext, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExtractFieldsParams {
    /// Markup to list fields from; the current page when omitted
    #[serde(default)]
    pub html: Option<String>,
}

/// Tool listing the form controls of an HTML string or of the current page
#[derive(Default)]
pub struct ExtractFieldsTool;

impl Tool for ExtractFieldsTool {
    type Params = ExtractFieldsParams;

    fn name(&self) -> &str {
        "extract_fields"
    }

    fn execute_typed(&self, params: ExtractFieldsParams, context: &mut ToolContext) -> Result<ToolResult> {
        let fields = match params.html.as_deref() {
            Some(html) => extract_fields(html),
            None => extract_fields_from(context.page.document()),
        };

        Ok(ToolResult::success_with(serde_json::json!({
            "count": fields.len(),
            "fields": fields,
        })))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BuildRequestParams {
    /// What the user wants filled in, in their own words
    pub user_input: String,

    /// Send the flat field listing instead of the element tree (default: false)
    #[serde(default)]
    pub flat: bool,
}

/// Tool assembling the mapping request for the current page
#[derive(Default)]
pub struct BuildRequestTool;

impl Tool for BuildRequestTool {
    type Params = BuildRequestParams;

    fn name(&self) -> &str {
        "build_mapping_request"
    }

    fn execute_typed(&self, params: BuildRequestParams, context: &mut ToolContext) -> Result<ToolResult> {
        let request = if params.flat {
            MappingRequest::from_fields(extract_fields_from(context.page.document()), params.user_input)
        } else {
            let snapshot = context.session.extract(&*context.page)?;
            MappingRequest::from_snapshot(&snapshot, params.user_input)
        };

        let request = match request {
            Ok(request) => request,
            Err(e @ AutofillError::InvalidRequest(_)) => return Ok(ToolResult::failure(e.to_string())),
            Err(e) => return Err(e),
        };

        let data = serde_json::to_value(&request).map_err(|e| AutofillError::ToolExecutionFailed {
            tool: "build_mapping_request".to_string(),
            reason: e.to_string(),
        })?;
        Ok(ToolResult::success_with(data))
    }
}
