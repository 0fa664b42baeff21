//! Block-structured output strategy: Anthropic Messages streaming events.

use bytes::Bytes;
use serde_json::json;

use aerogate_types::gemini::UsageMetadata;

use super::state::{BlockKind, OutputFormat};
use crate::proxy::mappers::claude::response::map_stop_reason;
use crate::proxy::mappers::random_call_id;

pub struct ClaudeFormat {
    message_id: String,
    model: String,
}

impl ClaudeFormat {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            message_id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
            model: model.into(),
        }
    }

    fn event(&self, event_type: &str, data: serde_json::Value) -> Bytes {
        let sse = format!(
            "event: {}\ndata: {}\n\n",
            event_type,
            serde_json::to_string(&data).unwrap_or_default()
        );
        Bytes::from(sse)
    }

    fn delta(&self, index: usize, delta: serde_json::Value) -> Bytes {
        self.event(
            "content_block_delta",
            json!({
                "type": "content_block_delta",
                "index": index,
                "delta": delta,
            }),
        )
    }

    fn stop(&self, index: usize) -> Bytes {
        self.event(
            "content_block_stop",
            json!({ "type": "content_block_stop", "index": index }),
        )
    }
}

impl OutputFormat for ClaudeFormat {
    fn preamble(&mut self) -> Vec<Bytes> {
        vec![self.event(
            "message_start",
            json!({
                "type": "message_start",
                "message": {
                    "id": &self.message_id,
                    "type": "message",
                    "role": "assistant",
                    "content": [],
                    "model": &self.model,
                    "stop_reason": null,
                    "stop_sequence": null,
                    "usage": { "input_tokens": 0, "output_tokens": 0 },
                },
            }),
        )]
    }

    fn block_start(&mut self, kind: BlockKind, index: usize) -> Vec<Bytes> {
        let content_block = match kind {
            BlockKind::Thinking => json!({ "type": "thinking", "thinking": "" }),
            _ => json!({ "type": "text", "text": "" }),
        };
        vec![self.event(
            "content_block_start",
            json!({
                "type": "content_block_start",
                "index": index,
                "content_block": content_block,
            }),
        )]
    }

    fn content_delta(&mut self, kind: BlockKind, index: usize, text: &str) -> Vec<Bytes> {
        let delta = match kind {
            BlockKind::Thinking => json!({ "type": "thinking_delta", "thinking": text }),
            _ => json!({ "type": "text_delta", "text": text }),
        };
        vec![self.delta(index, delta)]
    }

    fn block_stop(&mut self, _kind: BlockKind, index: usize) -> Vec<Bytes> {
        vec![self.stop(index)]
    }

    fn tool_block(&mut self, index: usize, name: &str, args_json: &str) -> Vec<Bytes> {
        vec![
            self.event(
                "content_block_start",
                json!({
                    "type": "content_block_start",
                    "index": index,
                    "content_block": {
                        "type": "tool_use",
                        "id": format!("toolu_{}", random_call_id()),
                        "name": name,
                        "input": {},
                    },
                }),
            ),
            self.delta(index, json!({ "type": "input_json_delta", "partial_json": args_json })),
            self.stop(index),
        ]
    }

    fn finish(
        &mut self,
        finish_reason: Option<&str>,
        used_tool: bool,
        usage: Option<&UsageMetadata>,
    ) -> Vec<Bytes> {
        let output_tokens = usage.map(|u| u.candidates_token_count).unwrap_or(0);
        vec![self.event(
            "message_delta",
            json!({
                "type": "message_delta",
                "delta": {
                    "stop_reason": map_stop_reason(finish_reason, used_tool),
                    "stop_sequence": null,
                },
                "usage": { "output_tokens": output_tokens },
            }),
        )]
    }

    fn terminator(&mut self) -> Vec<Bytes> {
        vec![Bytes::from_static(b"event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(chunks: &[Bytes]) -> String {
        chunks.iter().map(|b| String::from_utf8(b.to_vec()).unwrap()).collect()
    }

    #[test]
    fn test_preamble_is_message_start() {
        let mut format = ClaudeFormat::new("gemini-3-pro-preview");
        let out = text_of(&format.preamble());
        assert!(out.starts_with("event: message_start\n"));
        assert!(out.contains("\"role\":\"assistant\""));
        assert!(out.contains("gemini-3-pro-preview"));
    }

    #[test]
    fn test_block_start_shapes() {
        let mut format = ClaudeFormat::new("m");
        let thinking = text_of(&format.block_start(BlockKind::Thinking, 0));
        assert!(thinking.contains("\"type\":\"thinking\""));
        assert!(thinking.contains("\"index\":0"));

        let text = text_of(&format.block_start(BlockKind::Text, 1));
        assert!(text.contains("\"type\":\"text\""));
        assert!(text.contains("\"index\":1"));
    }

    #[test]
    fn test_deltas_carry_block_index() {
        let mut format = ClaudeFormat::new("m");
        let out = text_of(&format.content_delta(BlockKind::Text, 2, "hi"));
        assert!(out.contains("\"index\":2"));
        assert!(out.contains("\"type\":\"text_delta\""));
        assert!(out.contains("\"text\":\"hi\""));
    }

    #[test]
    fn test_tool_block_start_delta_stop() {
        let mut format = ClaudeFormat::new("m");
        let chunks = format.tool_block(3, "get_weather", r#"{"city":"Oslo"}"#);
        assert_eq!(chunks.len(), 3);
        let out = text_of(&chunks);
        assert!(out.contains("event: content_block_start"));
        assert!(out.contains("\"type\":\"tool_use\""));
        assert!(out.contains("input_json_delta"));
        assert!(out.contains("event: content_block_stop"));
        assert!(out.contains("toolu_"));
    }

    #[test]
    fn test_finish_and_terminator() {
        let mut format = ClaudeFormat::new("m");
        let usage = UsageMetadata {
            prompt_token_count: 1,
            candidates_token_count: 9,
            total_token_count: 10,
        };
        let out = text_of(&format.finish(Some("STOP"), false, Some(&usage)));
        assert!(out.contains("event: message_delta"));
        assert!(out.contains("\"stop_reason\":\"end_turn\""));
        assert!(out.contains("\"output_tokens\":9"));

        let stop = text_of(&format.terminator());
        assert_eq!(stop, "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
    }
}
