//! The per-stream state machine shared by both output shapes.

use bytes::Bytes;

use aerogate_types::gemini::{GenerateContentResponse, PartKind, UsageMetadata};

/// The kind of content block currently open on the outgoing stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    None,
    Thinking,
    Text,
    Tool,
}

/// Wire envelope for one client protocol.
///
/// Block transitions are decided by [`StreamState`]; a format only renders
/// them. Formats without block structure (OpenAI) render block start/stop
/// as nothing and still see consistent indices.
pub trait OutputFormat: Send {
    /// Events that precede any content (e.g. `message_start`).
    fn preamble(&mut self) -> Vec<Bytes>;

    /// A thinking or text block opens at `index`.
    fn block_start(&mut self, kind: BlockKind, index: usize) -> Vec<Bytes>;

    /// Delta inside an open thinking or text block.
    fn content_delta(&mut self, kind: BlockKind, index: usize, text: &str) -> Vec<Bytes>;

    /// The block at `index` closes.
    fn block_stop(&mut self, kind: BlockKind, index: usize) -> Vec<Bytes>;

    /// One atomic tool call: open a tool-use block at `index`, emit exactly
    /// one delta carrying the serialized arguments, close the block.
    fn tool_block(&mut self, index: usize, name: &str, args_json: &str) -> Vec<Bytes>;

    /// Finish summary (stop reason + usage).
    fn finish(
        &mut self,
        finish_reason: Option<&str>,
        used_tool: bool,
        usage: Option<&UsageMetadata>,
    ) -> Vec<Bytes>;

    /// Stream terminator (`[DONE]` or `message_stop`).
    fn terminator(&mut self) -> Vec<Bytes>;
}

/// One outbound stream's transient state. Created per upstream call and
/// discarded when the stream closes or errors.
pub struct StreamState<F: OutputFormat> {
    format: F,
    block_index: usize,
    open_block: BlockKind,
    used_tool: bool,
    finish_sent: bool,
    usage: Option<UsageMetadata>,
}

impl<F: OutputFormat> StreamState<F> {
    pub fn new(format: F) -> Self {
        Self {
            format,
            block_index: 0,
            open_block: BlockKind::None,
            used_tool: false,
            finish_sent: false,
            usage: None,
        }
    }

    pub fn block_index(&self) -> usize {
        self.block_index
    }

    pub fn open_block(&self) -> BlockKind {
        self.open_block
    }

    /// Events to emit before the first record.
    pub fn start(&mut self) -> Vec<Bytes> {
        self.format.preamble()
    }

    /// Re-encode one decoded upstream record into zero or more events.
    pub fn process_record(&mut self, body: &GenerateContentResponse) -> Vec<Bytes> {
        let mut out = Vec::new();

        if let Some(usage) = body.usage_metadata {
            self.usage = Some(usage);
        }

        for part in body.parts() {
            for kind in part.kinds() {
                match kind {
                    PartKind::Thinking(text) => {
                        if text.is_empty() {
                            continue;
                        }
                        out.extend(self.ensure_block(BlockKind::Thinking));
                        out.extend(self.format.content_delta(
                            BlockKind::Thinking,
                            self.block_index,
                            text,
                        ));
                    }
                    PartKind::Text(text) => {
                        if text.is_empty() {
                            continue;
                        }
                        out.extend(self.ensure_block(BlockKind::Text));
                        out.extend(self.format.content_delta(
                            BlockKind::Text,
                            self.block_index,
                            text,
                        ));
                    }
                    PartKind::FunctionCall(fc) => {
                        // Tool calls are atomic: whatever is open closes, the
                        // tool block opens, carries one delta, and closes.
                        out.extend(self.close_block());
                        let args = fc
                            .args
                            .clone()
                            .unwrap_or_else(|| serde_json::json!({}))
                            .to_string();
                        out.extend(self.format.tool_block(self.block_index, &fc.name, &args));
                        self.block_index += 1;
                        self.used_tool = true;
                    }
                }
            }
        }

        if let Some(reason) = body.finish_reason() {
            let reason = reason.to_string();
            out.extend(self.close_block());
            out.extend(self.emit_finish(Some(&reason)));
        }

        out
    }

    /// Upstream reader reported completion: close any dangling block, emit
    /// the finish summary if the provider never sent one, then terminate.
    pub fn finalize(&mut self) -> Vec<Bytes> {
        let mut out = self.close_block();
        if !self.finish_sent {
            out.extend(self.emit_finish(None));
        }
        out.extend(self.format.terminator());
        out
    }

    fn ensure_block(&mut self, kind: BlockKind) -> Vec<Bytes> {
        if self.open_block == kind {
            return Vec::new();
        }
        let mut out = self.close_block();
        out.extend(self.format.block_start(kind, self.block_index));
        self.open_block = kind;
        out
    }

    fn close_block(&mut self) -> Vec<Bytes> {
        if self.open_block == BlockKind::None {
            return Vec::new();
        }
        let out = self.format.block_stop(self.open_block, self.block_index);
        self.block_index += 1;
        self.open_block = BlockKind::None;
        out
    }

    fn emit_finish(&mut self, reason: Option<&str>) -> Vec<Bytes> {
        if self.finish_sent {
            return Vec::new();
        }
        self.finish_sent = true;
        self.format.finish(reason, self.used_tool, self.usage.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every transition instead of rendering a wire shape, so the
    /// shared logic can be asserted independently of either envelope.
    #[derive(Default)]
    struct Recording {
        events: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl Recording {
        fn log(&self, event: String) -> Vec<Bytes> {
            self.events.lock().unwrap().push(event);
            vec![Bytes::new()]
        }
    }

    impl OutputFormat for Recording {
        fn preamble(&mut self) -> Vec<Bytes> {
            self.log("preamble".into())
        }
        fn block_start(&mut self, kind: BlockKind, index: usize) -> Vec<Bytes> {
            self.log(format!("start:{kind:?}:{index}"))
        }
        fn content_delta(&mut self, kind: BlockKind, index: usize, text: &str) -> Vec<Bytes> {
            self.log(format!("delta:{kind:?}:{index}:{text}"))
        }
        fn block_stop(&mut self, kind: BlockKind, index: usize) -> Vec<Bytes> {
            self.log(format!("stop:{kind:?}:{index}"))
        }
        fn tool_block(&mut self, index: usize, name: &str, args_json: &str) -> Vec<Bytes> {
            self.log(format!("tool:{index}:{name}:{args_json}"))
        }
        fn finish(
            &mut self,
            finish_reason: Option<&str>,
            used_tool: bool,
            _usage: Option<&UsageMetadata>,
        ) -> Vec<Bytes> {
            self.log(format!("finish:{:?}:{used_tool}", finish_reason))
        }
        fn terminator(&mut self) -> Vec<Bytes> {
            self.log("terminator".into())
        }
    }

    fn record(raw: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(raw).unwrap()
    }

    fn run(records: &[serde_json::Value]) -> Vec<String> {
        let format = Recording::default();
        let events = std::sync::Arc::clone(&format.events);
        let mut state = StreamState::new(format);
        state.start();
        for raw in records {
            state.process_record(&record(raw.clone()));
        }
        state.finalize();
        let out = events.lock().unwrap().clone();
        out
    }

    #[test]
    fn test_text_block_opened_once_for_consecutive_deltas() {
        let events = run(&[
            serde_json::json!({"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}),
            serde_json::json!({"candidates":[{"content":{"parts":[{"text":"lo"}]}}]}),
        ]);
        assert_eq!(
            events,
            vec![
                "preamble",
                "start:Text:0",
                "delta:Text:0:Hel",
                "delta:Text:0:lo",
                "stop:Text:0",
                "finish:None:false",
                "terminator",
            ]
        );
    }

    #[test]
    fn test_thinking_then_text_closes_and_advances_index() {
        let events = run(&[serde_json::json!({"candidates":[{"content":{"parts":[
            {"text":"hmm","thought":true},
            {"text":"answer"},
        ]}}]})]);
        assert_eq!(
            events,
            vec![
                "preamble",
                "start:Thinking:0",
                "delta:Thinking:0:hmm",
                "stop:Thinking:0",
                "start:Text:1",
                "delta:Text:1:answer",
                "stop:Text:1",
                "finish:None:false",
                "terminator",
            ]
        );
    }

    #[test]
    fn test_tool_call_is_atomic_and_closes_open_block() {
        let events = run(&[serde_json::json!({"candidates":[{"content":{"parts":[
            {"text":"calling"},
            {"functionCall":{"name":"get_weather","args":{"city":"Oslo"}}},
            {"text":"done"},
        ]}}]})]);
        assert_eq!(
            events,
            vec![
                "preamble",
                "start:Text:0",
                "delta:Text:0:calling",
                "stop:Text:0",
                "tool:1:get_weather:{\"city\":\"Oslo\"}",
                "start:Text:2",
                "delta:Text:2:done",
                "stop:Text:2",
                "finish:None:true",
                "terminator",
            ]
        );
    }

    #[test]
    fn test_stop_record_closes_block_and_emits_finish_once() {
        let events = run(&[
            serde_json::json!({"candidates":[{"content":{"parts":[{"text":"hi"}]},"finishReason":"STOP"}]}),
        ]);
        assert_eq!(
            events,
            vec![
                "preamble",
                "start:Text:0",
                "delta:Text:0:hi",
                "stop:Text:0",
                "finish:Some(\"STOP\"):false",
                "terminator",
            ]
        );
    }

    #[test]
    fn test_empty_text_parts_do_not_open_blocks() {
        let events = run(&[
            serde_json::json!({"candidates":[{"content":{"parts":[{"text":""}]}}]}),
        ]);
        assert_eq!(events, vec!["preamble", "finish:None:false", "terminator"]);
    }
}
