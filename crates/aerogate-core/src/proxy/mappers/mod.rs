//! Bidirectional schema translation between client protocols and the
//! provider-native Gemini format.

pub mod claude;
pub mod models;
pub mod openai;

use serde_json::{json, Value};

/// Documented generation defaults applied when the client omits a value.
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_TOP_P: f64 = 0.85;
pub const DEFAULT_TOP_K: u32 = 50;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8096;

/// Numeric generation parameters shared by both client protocols.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
}

/// Build the Gemini `generationConfig` object, filling documented defaults
/// and requesting thought output for reasoning-capable models.
pub fn build_generation_config(params: &GenerationParams, thinking: bool) -> Value {
    let mut config = json!({
        "temperature": params.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        "topP": params.top_p.unwrap_or(DEFAULT_TOP_P),
        "topK": params.top_k.unwrap_or(DEFAULT_TOP_K),
        "maxOutputTokens": params.max_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
    });

    if thinking {
        config["thinkingConfig"] = json!({ "includeThoughts": true });
    }

    config
}

/// Decode a `data:<mime>;base64,<payload>` URI into its mime type and
/// base64 payload. Anything else (remote URLs included) is not inlinable.
pub fn parse_data_uri(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    if mime.is_empty() || payload.is_empty() {
        return None;
    }
    Some((mime, payload))
}

/// Short random id used to tag generated tool calls.
pub fn random_call_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..12].to_string()
}

/// Normalize one tool declaration into the provider's
/// `functionDeclarations` entry: missing description → empty string,
/// missing parameters → empty object.
pub fn function_declaration(
    name: &str,
    description: Option<&str>,
    parameters: Option<&Value>,
) -> Value {
    json!({
        "functionDeclarations": [{
            "name": name,
            "description": description.unwrap_or(""),
            "parameters": parameters.cloned().unwrap_or_else(|| json!({})),
        }]
    })
}
