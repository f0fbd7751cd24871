use thiserror::Error;

/// Errors that abort a whole extraction, mapping or injection run.
///
/// Problems with a single element never surface here: the extractor filters
/// them out and the injector turns them into [`crate::inject::FieldWarning`]s.
#[derive(Debug, Error)]
pub enum AutofillError {
    /// The page could not be walked at all (no document, no body).
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// The model answered with something that is not a mapping response.
    #[error("AI response error: {0}")]
    AiResponse(String),

    /// There is no page to inject into.
    #[error("No active page context: {0}")]
    InjectionInfrastructure(String),

    /// The mapping request was rejected before it was sent.
    #[error("Invalid mapping request: {0}")]
    InvalidRequest(String),

    /// The call to the model endpoint failed.
    #[error("Mapping request failed: {0}")]
    MapperRequest(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Tool '{0}' is not registered")]
    ToolNotFound(String),

    #[error("Invalid parameters for '{tool}': {reason}")]
    InvalidParams { tool: String, reason: String },

    #[error("Tool '{tool}' failed: {reason}")]
    ToolExecutionFailed { tool: String, reason: String },
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, AutofillError>;
