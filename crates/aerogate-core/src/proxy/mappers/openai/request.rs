//! OpenAI chat request → Gemini `generateContent` body.

use serde_json::{json, Value};

use aerogate_types::openai::{
    ChatCompletionRequest, ChatContent, ChatRole, ChatTool, ContentPart,
};

use crate::proxy::mappers::{
    build_generation_config, function_declaration, models, parse_data_uri, GenerationParams,
};

/// Translate a client chat request into the provider-native request body.
pub fn build_generate_request(request: &ChatCompletionRequest) -> Value {
    let mut contents: Vec<Value> = Vec::new();
    let mut system_texts: Vec<String> = Vec::new();

    for message in &request.messages {
        if message.role == ChatRole::System {
            // All system content folds into one system instruction; later
            // system messages concatenate rather than opening new turns.
            let text = match &message.content {
                ChatContent::Text(t) => t.clone(),
                ChatContent::Parts(parts) => parts
                    .iter()
                    .filter_map(|p| match p {
                        ContentPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(""),
            };
            if !text.is_empty() {
                system_texts.push(text);
            }
            continue;
        }

        let role = if message.role == ChatRole::Assistant { "model" } else { "user" };

        let parts = match &message.content {
            ChatContent::Text(text) => vec![json!({ "text": text })],
            ChatContent::Parts(parts) => convert_parts(parts),
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

    if !system_texts.is_empty() {
        body["systemInstruction"] = json!({
            "role": "user",
            "parts": [{ "text": system_texts.join("\n") }],
        });
    }

    if let Some(tools) = convert_tools(request.tools.as_deref()) {
        body["tools"] = tools;
    }

    body
}

fn convert_parts(parts: &[ContentPart]) -> Vec<Value> {
    let mut out = Vec::new();
    for part in parts {
        match part {
            ContentPart::Text { text } => out.push(json!({ "text": text })),
            ContentPart::ImageUrl { image_url } => {
                if let Some((mime, data)) = parse_data_uri(&image_url.url) {
                    out.push(json!({
                        "inlineData": { "mimeType": mime, "data": data }
                    }));
                } else {
                    tracing::debug!("Dropping non-inlinable image part");
                }
            }
            ContentPart::Other(_) => {
                tracing::debug!("Dropping unrecognized content part");
            }
        }
    }
    out
}

fn convert_tools(tools: Option<&[ChatTool]>) -> Option<Value> {
    let tools = tools?;
    let declarations: Vec<Value> = tools
        .iter()
        .filter_map(|tool| {
            if tool.tool_type != "function" {
                tracing::debug!("Dropping unsupported tool type: {}", tool.tool_type);
                return None;
            }
            let function = tool.function.as_ref()?;
            Some(function_declaration(
                &function.name,
                function.description.as_deref(),
                function.parameters.as_ref(),
            ))
        })
        .collect();

    if declarations.is_empty() {
        None
    } else {
        Some(Value::Array(declarations))
    }
}
