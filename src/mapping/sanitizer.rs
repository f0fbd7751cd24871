use crate::error::{AutofillError, Result};
use crate::mapping::{MappedField, MappingResponse, MappingStatus};
use serde_json::Value;

/// Turns a model's raw answer into text that should parse as JSON.
///
/// Providers disagree on how they wrap JSON, so this is swappable per mapper.
pub trait ResponseSanitizer: Send + Sync {
    fn sanitize(&self, raw: &str) -> String;

    fn name(&self) -> &'static str;
}

/// Strips markdown code fences and `//` line comments outside JSON strings
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownJsonSanitizer;

impl ResponseSanitizer for MarkdownJsonSanitizer {
    fn sanitize(&self, raw: &str) -> String {
        let unfenced = strip_code_fence(raw.trim());
        let uncommented = strip_line_comments(unfenced);
        json_span(uncommented.trim()).to_string()
    }

    fn name(&self) -> &'static str {
        "markdown-json"
    }
}

/// Leaves the response untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughSanitizer;

impl ResponseSanitizer for PassthroughSanitizer {
    fn sanitize(&self, raw: &str) -> String {
        raw.to_string()
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// Body of the first fenced block, or the text itself when there is none
fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    let body = match after_open.find('\n') {
        Some(newline) if is_language_tag(&after_open[..newline]) => &after_open[newline + 1..],
        _ => after_open,
    };
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

/// A lone word such as `json` after the fence, never the start of the payload
fn is_language_tag(line: &str) -> bool {
    let tag = line.trim();
    !tag.starts_with(['{', '[']) && !tag.contains(char::is_whitespace)
}

fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// From the first `{`/`[` to the last `}`/`]`, dropping prose around the JSON
fn json_span(text: &str) -> &str {
    let start = text.find(['{', '[']);
    let end = text.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if start <= end => &text[start..=end],
        _ => text,
    }
}

/// Sanitize and parse a raw model answer.
///
/// A bare array is accepted as the field list of a completed response.
pub fn parse_mapping_response(raw: &str, sanitizer: &dyn ResponseSanitizer) -> Result<MappingResponse> {
    let cleaned = sanitizer.sanitize(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        log::debug!("Unparsable response after {} sanitizing: {}", sanitizer.name(), cleaned);
        AutofillError::AiResponse(format!("Failed to parse AI response: {}", e))
    })?;

    match value {
        Value::Array(_) => {
            let fields: Vec<MappedField> = serde_json::from_value(value)
                .map_err(|e| AutofillError::AiResponse(format!("Invalid field list: {}", e)))?;
            Ok(MappingResponse::new(MappingStatus::Completed, fields))
        }
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| AutofillError::AiResponse(format!("AI response format is incorrect: {}", e))),
        other => Err(AutofillError::AiResponse(format!(
            "AI response format is incorrect: expected an object, got {}",
            other
        ))),
    }
}
