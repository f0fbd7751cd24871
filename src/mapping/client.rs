use crate::error::{AutofillError, Result};
use crate::mapping::sanitizer::{parse_mapping_response, MarkdownJsonSanitizer, ResponseSanitizer};
use crate::mapping::{MappingRequest, MappingResponse};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "You are a form-filling assistant. Analyze the user's input and the provided form structure, \
decide a value for every field the input covers, and answer with JSON only.";

/// The language model behind the mapping step: structured request in,
/// field list out
#[async_trait]
pub trait FieldMapper: Send + Sync {
    async fn map_fields(&self, request: &MappingRequest) -> Result<MappingResponse>;
}

/// Endpoint settings for [`OpenAiMapper`]; unset fields fall back to the
/// environment, then to defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapperConfig {
    pub base_url: Option<String>,
    /// Never logged. An explicit empty key means the endpoint needs none.
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl MapperConfig {
    /// Base URL: field → `OPENAI_BASE_URL` → `https://api.openai.com/v1`
    pub fn resolve_base_url(&self) -> String {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.to_string();
        }
        std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// API key: field (even empty) → `OPENAI_API_KEY` → none
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            return Some(key.trim().to_string());
        }
        std::env::var("OPENAI_API_KEY").ok().filter(|v| !v.trim().is_empty())
    }

    /// Model: field → `FORM_AUTOFILL_MODEL` → `gpt-4o-mini`
    pub fn resolve_model(&self) -> String {
        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            return model.to_string();
        }
        std::env::var("FORM_AUTOFILL_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn resolve_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// Client for any OpenAI-compatible `chat/completions` endpoint
pub struct OpenAiMapper {
    http: reqwest::Client,
    config: MapperConfig,
    sanitizer: Box<dyn ResponseSanitizer>,
}

impl std::fmt::Debug for OpenAiMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiMapper")
            .field("base_url", &self.config.resolve_base_url())
            .field("model", &self.config.resolve_model())
            .field("sanitizer", &self.sanitizer.name())
            .finish()
    }
}

impl OpenAiMapper {
    pub fn new(config: MapperConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.resolve_timeout())
            .build()
            .map_err(|e| AutofillError::MapperRequest(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            config,
            sanitizer: Box::new(MarkdownJsonSanitizer),
        })
    }

    /// Builder method: replace the response sanitizer
    pub fn with_sanitizer(mut self, sanitizer: impl ResponseSanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// JSON body of the chat completion call
    pub fn request_body(&self, request: &MappingRequest) -> Result<Value> {
        Ok(serde_json::json!({
            "model": self.config.resolve_model(),
            "temperature": self.config.resolve_temperature(),
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": request.to_prompt()?}
            ]
        }))
    }
}

/// `choices[0].message.content` of a chat completion
fn completion_content(value: &Value) -> Option<&str> {
    value
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .filter(|s| !s.trim().is_empty())
}

#[async_trait]
impl FieldMapper for OpenAiMapper {
    async fn map_fields(&self, request: &MappingRequest) -> Result<MappingResponse> {
        request.validate()?;

        let url = format!("{}/chat/completions", self.config.resolve_base_url().trim_end_matches('/'));
        let body = self.request_body(request)?;
        log::debug!("Requesting field mapping from {}", url);

        let builder = self.http.post(&url).json(&body);
        let builder = match self.config.resolve_api_key() {
            Some(key) if !key.is_empty() => builder.bearer_auth(key),
            _ => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| AutofillError::MapperRequest(format!("chat.completions request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AutofillError::MapperRequest(format!(
                "chat.completions failed: status={} body={}",
                status, text
            )));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| AutofillError::AiResponse(format!("Completion is not JSON: {}", e)))?;

        if let Some(usage) = value.get("usage").and_then(|u| u.get("total_tokens")) {
            log::info!("Field mapping used {} tokens", usage);
        }

        let content = completion_content(&value)
            .ok_or_else(|| AutofillError::AiResponse("Completion has no message content".to_string()))?;
        parse_mapping_response(content, self.sanitizer.as_ref())
    }
}

/// Mapper that answers every request with the same raw text, run through a
/// sanitizer like a real model answer. Used for replaying saved responses.
pub struct CannedMapper {
    raw: String,
    sanitizer: Box<dyn ResponseSanitizer>,
}

impl CannedMapper {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            sanitizer: Box::new(MarkdownJsonSanitizer),
        }
    }

    /// Builder method: replace the response sanitizer
    pub fn with_sanitizer(mut self, sanitizer: impl ResponseSanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }
}

#[async_trait]
impl FieldMapper for CannedMapper {
    async fn map_fields(&self, request: &MappingRequest) -> Result<MappingResponse> {
        request.validate()?;
        parse_mapping_response(&self.raw, self.sanitizer.as_ref())
    }
}
