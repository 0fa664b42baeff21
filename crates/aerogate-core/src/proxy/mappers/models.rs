//! Static model capability table for the Antigravity provider.

use serde_json::{json, Value};

/// A known upstream model and its capabilities.
pub struct ModelInfo {
    pub id: &'static str,
    /// Whether the model can emit thought output (reasoning-capable).
    pub thinking: bool,
}

/// Models the Antigravity backend serves.
pub const KNOWN_MODELS: &[ModelInfo] = &[
    ModelInfo { id: "gemini-3-pro-preview", thinking: true },
    ModelInfo { id: "gemini-3-pro-image", thinking: false },
    ModelInfo { id: "gemini-3-flash", thinking: true },
    ModelInfo { id: "gemini-2.5-flash", thinking: false },
    ModelInfo { id: "gemini-2.5-flash-lite", thinking: false },
];

/// Whether requests for this model should ask for thought output.
pub fn is_thinking_model(model: &str) -> bool {
    let lower = model.to_ascii_lowercase();
    if lower.ends_with("-thinking") {
        return true;
    }
    KNOWN_MODELS.iter().any(|m| m.id == lower && m.thinking)
}

/// OpenAI-shaped model listing served from the static table.
pub fn model_list() -> Value {
    let data: Vec<Value> = KNOWN_MODELS
        .iter()
        .map(|m| {
            json!({
                "id": m.id,
                "object": "model",
                "owned_by": "antigravity",
            })
        })
        .collect();
    json!({ "object": "list", "data": data })
}
