//! Google Gemini GenerateContent API types (provider-native wire format).
//!
//! Upstream payloads are dynamically shaped: stream records sometimes wrap
//! the body in a `response` envelope and sometimes do not. [`StreamRecord`]
//! models that union explicitly so the unwrap happens at exactly one
//! boundary instead of ad-hoc optional chaining downstream.

use serde::{Deserialize, Serialize};

/// One decoded upstream payload: candidates plus usage counters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// Ordered parts of the first candidate; empty when the payload carries
    /// no content (e.g. a usage-only record).
    pub fn parts(&self) -> &[GeminiPart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Finish reason of the first candidate, if present.
    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first().and_then(|c| c.finish_reason.as_deref())
    }
}

/// A raw stream record: either `{"response": {...}}` or the bare body.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamRecord {
    response: Option<GenerateContentResponse>,
    #[serde(flatten)]
    direct: GenerateContentResponse,
}

impl StreamRecord {
    /// Unwrap the optional envelope, preferring the wrapped body.
    pub fn into_inner(self) -> GenerateContentResponse {
        self.response.unwrap_or(self.direct)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

/// Ordered parts of one candidate turn.
#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// Gemini content part.
///
/// Parts are not mutually exclusive on the wire (a text part may carry a
/// `thought` flag), so this is a field bag rather than an enum; [`PartKind`]
/// classifies it for the re-encoder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPart {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
    pub function_call: Option<GeminiFunctionCall>,
    pub inline_data: Option<GeminiInlineData>,
}

/// The content kind a part resolves to, in the order the re-encoder and the
/// non-stream translator both consume.
#[derive(Debug, Clone, PartialEq)]
pub enum PartKind<'a> {
    Thinking(&'a str),
    Text(&'a str),
    FunctionCall(&'a GeminiFunctionCall),
}

impl GeminiPart {
    /// Classify this part. A part can yield both text and a function call;
    /// callers receive them in wire order (text first).
    pub fn kinds(&self) -> Vec<PartKind<'_>> {
        let mut kinds = Vec::new();
        if let Some(text) = self.text.as_deref() {
            if self.thought {
                kinds.push(PartKind::Thinking(text));
            } else {
                kinds.push(PartKind::Text(text));
            }
        }
        if let Some(fc) = &self.function_call {
            kinds.push(PartKind::FunctionCall(fc));
        }
        kinds
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiFunctionCall {
    pub name: String,
    pub args: Option<serde_json::Value>,
}

/// Inline binary data (images).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiInlineData {
    pub mime_type: String,
    pub data: String,
}

/// Gemini usage metadata; absent counters default to 0.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
    #[serde(default)]
    pub total_token_count: u32,
}
