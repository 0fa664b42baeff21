//! Flat-delta output strategy: OpenAI `chat.completion.chunk` events.
//!
//! This shape has no block structure on the wire, so block start/stop
//! render as nothing; only deltas, the finish chunk, the trailing usage
//! chunk, and the `[DONE]` sentinel are emitted.

use bytes::Bytes;
use serde_json::json;

use aerogate_types::gemini::UsageMetadata;

use super::state::{BlockKind, OutputFormat};
use crate::proxy::mappers::openai::response::map_finish_reason;
use crate::proxy::mappers::random_call_id;

pub struct OpenAiFormat {
    stream_id: String,
    created: i64,
    model: String,
}

impl OpenAiFormat {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            stream_id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            created: chrono::Utc::now().timestamp(),
            model: model.into(),
        }
    }

    fn chunk(&self, delta: serde_json::Value, finish_reason: Option<&str>) -> Bytes {
        let payload = json!({
            "id": &self.stream_id,
            "object": "chat.completion.chunk",
            "created": self.created,
            "model": &self.model,
            "choices": [{
                "index": 0,
                "delta": delta,
                "finish_reason": finish_reason,
            }],
        });
        sse_data(&payload)
    }
}

impl OutputFormat for OpenAiFormat {
    fn preamble(&mut self) -> Vec<Bytes> {
        Vec::new()
    }

    fn block_start(&mut self, _kind: BlockKind, _index: usize) -> Vec<Bytes> {
        Vec::new()
    }

    fn content_delta(&mut self, kind: BlockKind, _index: usize, text: &str) -> Vec<Bytes> {
        let delta = match kind {
            BlockKind::Thinking => json!({ "reasoning_content": text }),
            _ => json!({ "content": text }),
        };
        vec![self.chunk(delta, None)]
    }

    fn block_stop(&mut self, _kind: BlockKind, _index: usize) -> Vec<Bytes> {
        Vec::new()
    }

    fn tool_block(&mut self, _index: usize, name: &str, args_json: &str) -> Vec<Bytes> {
        let delta = json!({
            "tool_calls": [{
                "index": 0,
                "id": format!("call_{}", random_call_id()),
                "type": "function",
                "function": { "name": name, "arguments": args_json },
            }],
        });
        vec![self.chunk(delta, None)]
    }

    fn finish(
        &mut self,
        finish_reason: Option<&str>,
        used_tool: bool,
        usage: Option<&UsageMetadata>,
    ) -> Vec<Bytes> {
        let reason =
            if used_tool { "tool_calls" } else { map_finish_reason(finish_reason) };
        let mut out = vec![self.chunk(json!({}), Some(reason))];

        if let Some(usage) = usage {
            let payload = json!({
                "id": &self.stream_id,
                "object": "chat.completion.chunk",
                "created": self.created,
                "model": &self.model,
                "choices": [],
                "usage": {
                    "prompt_tokens": usage.prompt_token_count,
                    "completion_tokens": usage.candidates_token_count,
                    "total_tokens": usage.total_token_count,
                },
            });
            out.push(sse_data(&payload));
        }

        out
    }

    fn terminator(&mut self) -> Vec<Bytes> {
        vec![Bytes::from_static(b"data: [DONE]\n\n")]
    }
}

fn sse_data(payload: &serde_json::Value) -> Bytes {
    Bytes::from(format!("data: {}\n\n", payload))
}
