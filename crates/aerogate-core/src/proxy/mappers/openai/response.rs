//! Gemini non-stream response → OpenAI `chat.completion` object.

use aerogate_types::gemini::{GenerateContentResponse, PartKind};
use aerogate_types::openai::{
    AssistantMessage, ChatChoice, ChatCompletionResponse, ChatUsage, FunctionCallOut, ToolCall,
};

use crate::proxy::mappers::random_call_id;

/// Map the provider finish reason into the OpenAI vocabulary; unrecognized
/// reasons default to "stop".
pub fn map_finish_reason(reason: Option<&str>) -> &'static str {
    match reason {
        Some("MAX_TOKENS") => "length",
        Some("SAFETY") | Some("RECITATION") => "content_filter",
        _ => "stop",
    }
}

/// Translate one complete upstream payload into one client-shaped response.
pub fn transform_response(body: &GenerateContentResponse, model: &str) -> ChatCompletionResponse {
    let mut content = String::new();
    let mut reasoning = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    for part in body.parts() {
        for kind in part.kinds() {
            match kind {
                PartKind::Thinking(text) => reasoning.push_str(text),
                PartKind::Text(text) => content.push_str(text),
                PartKind::FunctionCall(fc) => {
                    let args = fc.args.clone().unwrap_or_else(|| serde_json::json!({}));
                    tool_calls.push(ToolCall {
                        id: format!("call_{}", random_call_id()),
                        call_type: "function".to_string(),
                        function: FunctionCallOut {
                            name: fc.name.clone(),
                            arguments: args.to_string(),
                        },
                    });
                }
            }
        }
    }

    let usage = body.usage_metadata.unwrap_or_default();

    let finish_reason = if tool_calls.is_empty() {
        map_finish_reason(body.finish_reason())
    } else {
        "tool_calls"
    };

    let message = AssistantMessage {
        role: "assistant".to_string(),
        content: if content.is_empty() { None } else { Some(content) },
        reasoning_content: if reasoning.is_empty() { None } else { Some(reasoning) },
        tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
    };

    ChatCompletionResponse {
        id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
        object: "chat.completion".to_string(),
        created: chrono::Utc::now().timestamp(),
        model: model.to_string(),
        choices: vec![ChatChoice {
            index: 0,
            message,
            finish_reason: finish_reason.to_string(),
        }],
        usage: ChatUsage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        },
    }
}
