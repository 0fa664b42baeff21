//! Anthropic messages request → Gemini `generateContent` body.

use serde_json::{json, Value};

use aerogate_types::claude::{
    ClaudeContent, ClaudeContentBlock, ClaudeRole, ClaudeTool, MessagesRequest, SystemPrompt,
};

use crate::proxy::mappers::{
    build_generation_config, function_declaration, models, GenerationParams,
};

/// Translate a Messages API request into the provider-native request body.
pub fn build_generate_request(request: &MessagesRequest) -> Value {
    let mut contents: Vec<Value> = Vec::new();

    for message in &request.messages {
        let role = if message.role == ClaudeRole::Assistant { "model" } else { "user" };

        let parts = match &message.content {
            ClaudeContent::Text(text) => vec![json!({ "text": text })],
            ClaudeContent::Blocks(blocks) => convert_blocks(blocks),
        };

        if !parts.is_empty() {
            contents.push(json!({ "role": role, "parts": parts }));
        }
    }

    let params = GenerationParams {
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: request.top_k,
        max_tokens: request.max_tokens,
    };

    let mut body = json!({
        "model": request.model,
        "contents": contents,
        "generationConfig":
            build_generation_config(&params, models::is_thinking_model(&request.model)),
    });

    if let Some(text) = system_text(request.system.as_ref()) {
        body["systemInstruction"] = json!({
            "role": "user",
            "parts": [{ "text": text }],
        });
    }

    if let Some(tools) = convert_tools(request.tools.as_deref()) {
        body["tools"] = tools;
    }

    body
}

/// Collapse the top-level system prompt into a single instruction text.
fn system_text(system: Option<&SystemPrompt>) -> Option<String> {
    let text = match system? {
        SystemPrompt::String(text) => text.clone(),
        SystemPrompt::Array(blocks) => blocks
            .iter()
            .filter(|b| b.block_type == "text")
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn convert_blocks(blocks: &[ClaudeContentBlock]) -> Vec<Value> {
    let mut parts = Vec::new();
    for block in blocks {
        match block {
            ClaudeContentBlock::Text { text } => parts.push(json!({ "text": text })),
            ClaudeContentBlock::Image { source } => {
                parts.push(json!({
                    "inlineData": {
                        "mimeType": source.media_type,
                        "data": source.data,
                    }
                }));
            }
            ClaudeContentBlock::Other(_) => {
                tracing::debug!("Dropping unrecognized content block");
            }
        }
    }
    parts
}

fn convert_tools(tools: Option<&[ClaudeTool]>) -> Option<Value> {
    let tools = tools?;
    if tools.is_empty() {
        return None;
    }
    let declarations: Vec<Value> = tools
        .iter()
        .map(|tool| {
            function_declaration(
                &tool.name,
                tool.description.as_deref(),
                tool.input_schema.as_ref(),
            )
        })
        .collect();
    Some(Value::Array(declarations))
}
