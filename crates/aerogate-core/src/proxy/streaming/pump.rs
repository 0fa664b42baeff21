//! Upstream-to-client stream driver.
//!
//! A pull-based `async_stream` loop: bytes come in as the upstream reader
//! completes, complete SSE lines are decoded, and translated events go out
//! only as the downstream consumer polls for them (backpressure). Dropping
//! the returned stream drops the upstream response, so an abandoned client
//! connection stops pulling bytes from the provider.

use std::pin::Pin;

use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use aerogate_types::gemini::StreamRecord;

use super::line_buffer::{SseLineBuffer, MAX_BUFFER_SIZE};
use super::state::{OutputFormat, StreamState};
use crate::error::truncate;

/// Re-encode a raw upstream SSE byte stream into a client-shaped event
/// stream using the given output strategy.
pub fn recode_stream<S, E, F>(
    upstream: S,
    format: F,
) -> Pin<Box<dyn Stream<Item = Result<Bytes, String>> + Send>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
    F: OutputFormat + 'static,
{
    Box::pin(stream! {
        let mut state = StreamState::new(format);
        let mut buffer = SseLineBuffer::new();
        let mut upstream = Box::pin(upstream);

        for chunk in state.start() {
            yield Ok(chunk);
        }

        while let Some(item) = upstream.next().await {
            match item {
                Ok(bytes) => {
                    buffer.push(&bytes);
                    if buffer.len() > MAX_BUFFER_SIZE {
                        tracing::error!("SSE buffer exceeded {} bytes, aborting stream", MAX_BUFFER_SIZE);
                        yield Err("SSE buffer overflow: response too large".to_string());
                        return;
                    }
                    while let Some(line) = buffer.next_line() {
                        for chunk in process_line(&line, &mut state) {
                            yield Ok(chunk);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Upstream stream error: {}", e);
                    yield Err(format!("Upstream stream error: {e}"));
                    return;
                }
            }
        }

        for chunk in state.finalize() {
            yield Ok(chunk);
        }
    })
}

/// Handle one SSE line. Malformed or non-JSON records are skipped without
/// aborting the stream.
fn process_line<F: OutputFormat>(line: &str, state: &mut StreamState<F>) -> Vec<Bytes> {
    let Some(data) = line.strip_prefix("data:") else {
        return Vec::new();
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Vec::new();
    }

    match serde_json::from_str::<StreamRecord>(data) {
        Ok(record) => state.process_record(&record.into_inner()),
        Err(e) => {
            tracing::warn!("Skipping malformed SSE record: {} | {}", e, truncate(data, 200));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::streaming::{ClaudeFormat, OpenAiFormat};
    use std::convert::Infallible;

    async fn run<F: OutputFormat + 'static>(chunks: Vec<Bytes>, format: F) -> Vec<String> {
        let items: Vec<Result<Bytes, Infallible>> = chunks.into_iter().map(Ok).collect();
        let mut stream = recode_stream(futures::stream::iter(items), format);

        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            out.push(String::from_utf8(item.unwrap().to_vec()).unwrap());
        }
        out
    }

    /// Concatenated (thinking, text) deltas plus tool (name, args) pairs
    /// extracted from Claude-shaped events: the observable outcome the
    /// chunking-invariance property quantifies over.
    fn digest(events: &[String]) -> (String, String, Vec<(String, String)>) {
        let mut thinking = String::new();
        let mut text = String::new();
        let mut tools = Vec::new();
        let mut pending_tool: Option<String> = None;

        for event in events {
            let Some(data_line) = event.lines().find(|l| l.starts_with("data: ")) else {
                continue;
            };
            let payload: serde_json::Value =
                serde_json::from_str(data_line.trim_start_matches("data: ")).unwrap();
            match payload["type"].as_str() {
                Some("content_block_start") => {
                    if payload["content_block"]["type"] == "tool_use" {
                        pending_tool =
                            Some(payload["content_block"]["name"].as_str().unwrap().to_string());
                    }
                }
                Some("content_block_delta") => match payload["delta"]["type"].as_str() {
                    Some("thinking_delta") => {
                        thinking.push_str(payload["delta"]["thinking"].as_str().unwrap());
                    }
                    Some("text_delta") => {
                        text.push_str(payload["delta"]["text"].as_str().unwrap());
                    }
                    Some("input_json_delta") => {
                        let name = pending_tool.take().unwrap();
                        tools.push((
                            name,
                            payload["delta"]["partial_json"].as_str().unwrap().to_string(),
                        ));
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        (thinking, text, tools)
    }

    fn sse_record(json: &str) -> Bytes {
        Bytes::from(format!("data: {json}\n\n"))
    }

    #[tokio::test]
    async fn test_hello_example_block_lifecycle() {
        // Two records split across reads, then stream end: one text block
        // opened once, two deltas, one close, terminator.
        let events = run(
            vec![
                sse_record(r#"{"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}"#),
                sse_record(r#"{"candidates":[{"content":{"parts":[{"text":"lo"}]}}]}"#),
            ],
            ClaudeFormat::new("m"),
        )
        .await;

        let starts = events.iter().filter(|e| e.contains("content_block_start")).count();
        let stops = events.iter().filter(|e| e.contains("content_block_stop")).count();
        assert_eq!(starts, 1);
        assert_eq!(stops, 1);
        assert!(events.last().unwrap().contains("message_stop"));

        let (_, text, _) = digest(&events);
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn test_chunking_invariance_across_all_split_points() {
        let payload: Vec<u8> = [
            r#"{"candidates":[{"content":{"parts":[{"text":"think ","thought":true}]}}]}"#,
            r#"{"response":{"candidates":[{"content":{"parts":[{"text":"héllo "}]}}]}}"#,
            r#"{"candidates":[{"content":{"parts":[{"functionCall":{"name":"lookup","args":{"q":"x"}}},{"text":"done"}]},"finishReason":"STOP"}]}"#,
        ]
        .iter()
        .map(|json| format!("data: {json}\n\n"))
        .collect::<String>()
        .into_bytes();

        let baseline = digest(
            &run(vec![Bytes::copy_from_slice(&payload)], ClaudeFormat::new("m")).await,
        );
        assert_eq!(baseline.0, "think ");
        assert_eq!(baseline.1, "héllo done");
        assert_eq!(baseline.2, vec![("lookup".to_string(), r#"{"q":"x"}"#.to_string())]);

        for split in 0..payload.len() {
            let events = run(
                vec![
                    Bytes::copy_from_slice(&payload[..split]),
                    Bytes::copy_from_slice(&payload[split..]),
                ],
                ClaudeFormat::new("m"),
            )
            .await;
            assert_eq!(digest(&events), baseline, "split at byte {split}");
        }
    }

    #[tokio::test]
    async fn test_malformed_record_skipped_without_abort() {
        let events = run(
            vec![
                Bytes::from_static(b"data: {not json}\n\n"),
                sse_record(r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#),
            ],
            ClaudeFormat::new("m"),
        )
        .await;

        let (_, text, _) = digest(&events);
        assert_eq!(text, "ok");
        assert!(events.last().unwrap().contains("message_stop"));
    }

    #[tokio::test]
    async fn test_openai_stream_ends_with_done_sentinel() {
        let events = run(
            vec![sse_record(
                r#"{"candidates":[{"content":{"parts":[{"text":"hi"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":1,"candidatesTokenCount":2,"totalTokenCount":3}}"#,
            )],
            OpenAiFormat::new("m"),
        )
        .await;

        assert!(events.iter().any(|e| e.contains("\"content\":\"hi\"")));
        assert!(events.iter().any(|e| e.contains("\"finish_reason\":\"stop\"")));
        assert!(events.iter().any(|e| e.contains("\"total_tokens\":3")));
        assert_eq!(events.last().unwrap(), "data: [DONE]\n\n");
    }

    #[tokio::test]
    async fn test_empty_upstream_still_emits_envelope() {
        let events = run(vec![Bytes::new()], ClaudeFormat::new("m")).await;
        assert!(events.first().unwrap().contains("message_start"));
        assert!(events.iter().any(|e| e.contains("message_delta")));
        assert!(events.last().unwrap().contains("message_stop"));
    }

    #[tokio::test]
    async fn test_upstream_error_terminates_stream() {
        let items: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from(sse_record(
                r#"{"candidates":[{"content":{"parts":[{"text":"partial"}]}}]}"#,
            ))),
            Err("connection reset".to_string()),
        ];
        let mut stream = recode_stream(futures::stream::iter(items), ClaudeFormat::new("m"));

        let mut saw_error = false;
        while let Some(item) = stream.next().await {
            if let Err(e) = item {
                assert!(e.contains("connection reset"));
                saw_error = true;
            }
        }
        assert!(saw_error);
    }
}
