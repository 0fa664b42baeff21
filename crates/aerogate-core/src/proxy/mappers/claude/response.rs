//! Gemini non-stream response → Anthropic message object.

use aerogate_types::claude::{ClaudeUsage, MessagesResponse, ResponseBlock};
use aerogate_types::gemini::{GenerateContentResponse, PartKind};

use crate::proxy::mappers::random_call_id;

/// Map the provider finish reason into the Messages API vocabulary.
/// Tool use takes precedence; unrecognized reasons default to "end_turn".
pub fn map_stop_reason(reason: Option<&str>, used_tool: bool) -> &'static str {
    if used_tool {
        return "tool_use";
    }
    match reason {
        Some("MAX_TOKENS") => "max_tokens",
        _ => "end_turn",
    }
}

/// Translate one complete upstream payload into one message response.
///
/// Consecutive parts of the same kind merge into a single content block,
/// mirroring the block structure the streaming re-encoder produces for the
/// same content.
pub fn transform_response(body: &GenerateContentResponse, model: &str) -> MessagesResponse {
    let mut content: Vec<ResponseBlock> = Vec::new();
    let mut used_tool = false;

    for part in body.parts() {
        for kind in part.kinds() {
            match kind {
                PartKind::Thinking(text) => {
                    if let Some(ResponseBlock::Thinking { thinking }) = content.last_mut() {
                        thinking.push_str(text);
                    } else {
                        content.push(ResponseBlock::Thinking { thinking: text.to_string() });
                    }
                }
                PartKind::Text(text) => {
                    if let Some(ResponseBlock::Text { text: existing }) = content.last_mut() {
                        existing.push_str(text);
                    } else {
                        content.push(ResponseBlock::Text { text: text.to_string() });
                    }
                }
                PartKind::FunctionCall(fc) => {
                    used_tool = true;
                    content.push(ResponseBlock::ToolUse {
                        id: format!("toolu_{}", random_call_id()),
                        name: fc.name.clone(),
                        input: fc.args.clone().unwrap_or_else(|| serde_json::json!({})),
                    });
                }
            }
        }
    }

    let usage = body.usage_metadata.unwrap_or_default();

    MessagesResponse {
        id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
        response_type: "message".to_string(),
        role: "assistant".to_string(),
        model: model.to_string(),
        content,
        stop_reason: map_stop_reason(body.finish_reason(), used_tool).to_string(),
        stop_sequence: None,
        usage: ClaudeUsage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        },
    }
}
