//! Model output parsing
//!
//! Keeps the string surgery on semi-structured model output away from the
//! business logic: thinking-block extraction, fence stripping and the two
//! fixed JSON schemas.

use crate::error::InvestigationError;
use crate::models::{NarrativeReport, StructuredChatResponse};
use crate::Result;

const THINKING_OPEN: &str = "<thinking>";
const THINKING_CLOSE: &str = "</thinking>";

/// Split raw model text into an optional reasoning block and the JSON
/// payload. The `<thinking>...</thinking>` block, when present, is removed
/// from the payload; fenced code markers are stripped either way.
pub fn extract_reasoning_and_payload(raw: &str) -> (Option<String>, String) {
    let mut text = raw.to_string();
    let mut reasoning = None;

    if let Some(open) = text.find(THINKING_OPEN) {
        if let Some(close_rel) = text[open + THINKING_OPEN.len()..].find(THINKING_CLOSE) {
            let inner_start = open + THINKING_OPEN.len();
            let inner_end = inner_start + close_rel;
            let inner = text[inner_start..inner_end].trim().to_string();
            if !inner.is_empty() {
                reasoning = Some(inner);
            }
            text.replace_range(open..inner_end + THINKING_CLOSE.len(), "");
        }
    }

    (reasoning, strip_fences(&text))
}

/// Strip ```json / ``` fences; when leftover prose surrounds the object,
/// fall back to the largest `{ ... }` window.
fn strip_fences(text: &str) -> String {
    let cleaned = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if cleaned.starts_with('{') {
        return cleaned.to_string();
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            return cleaned[start..=end].to_string();
        }
    }

    cleaned.to_string()
}

/// Parse the analytical narrative schema.
pub fn parse_narrative(text: &str) -> Result<NarrativeReport> {
    serde_json::from_str(text).map_err(|e| {
        InvestigationError::Parse(format!("narrative payload invalid: {} | raw={}", e, text))
    })
}

/// Parse the conversational follow-up schema.
pub fn parse_chat(text: &str) -> Result<StructuredChatResponse> {
    serde_json::from_str(text)
        .map_err(|e| InvestigationError::Parse(format!("chat payload invalid: {} | raw={}", e, text)))
}

/// Prepend extracted reasoning onto a narrative/response body.
pub fn merge_reasoning(reasoning: &str, body: &str) -> String {
    format!(
        "[Analyst Reasoning]\n{}\n\n[Conclusion]\n{}",
        reasoning.trim(),
        body.trim()
    )
}
