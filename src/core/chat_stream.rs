//! Streaming transport shared by all provider adapters.
//!
//! Drives one chat completion request as a server-sent-event stream and
//! forwards the text chunks over a channel. The sequence is finite and not
//! restartable: `End` (or `Error` followed by `End`) is always the last
//! message delivered for a turn.

use std::sync::Arc;

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ChatRequest, ChatResponse};
use crate::providers::ProviderAdapter;

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

/// Receiver half of a spawned stream plus its cancellation handle.
pub struct StreamHandle {
    pub rx: mpsc::UnboundedReceiver<StreamMessage>,
    pub cancel: CancellationToken,
}

/// Launch the request on a background task and hand back the chunk channel.
pub fn spawn_stream(
    client: reqwest::Client,
    adapter: Arc<dyn ProviderAdapter>,
    request: ChatRequest,
) -> StreamHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = run_stream(client, adapter, request, tx) => {}
            _ = token.cancelled() => {}
        }
    });

    StreamHandle { rx, cancel }
}

async fn run_stream(
    client: reqwest::Client,
    adapter: Arc<dyn ProviderAdapter>,
    request: ChatRequest,
    tx: mpsc::UnboundedSender<StreamMessage>,
) {
    let http_request = adapter.request_builder(&client).json(&request);

    match http_request.send().await {
        Ok(response) => {
            if !response.status().is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                let _ = tx.send(StreamMessage::Error(format_api_error(&error_text)));
                let _ = tx.send(StreamMessage::End);
                return;
            }

            let mut stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = stream.next().await {
                if let Ok(chunk_bytes) = chunk {
                    buffer.extend_from_slice(&chunk_bytes);

                    while let Some(newline_pos) = memchr(b'\n', &buffer) {
                        let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                            Ok(s) => s.trim(),
                            Err(e) => {
                                debug!("invalid UTF-8 in stream: {e}");
                                buffer.drain(..=newline_pos);
                                continue;
                            }
                        };

                        let should_end = process_sse_line(line, &tx);
                        buffer.drain(..=newline_pos);
                        if should_end {
                            return;
                        }
                    }
                }
            }

            let _ = tx.send(StreamMessage::End);
        }
        Err(e) => {
            let _ = tx.send(StreamMessage::Error(format_api_error(&e.to_string())));
            let _ = tx.send(StreamMessage::End);
        }
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Handle one SSE line; returns true when the stream is finished.
fn process_sse_line(line: &str, tx: &mpsc::UnboundedSender<StreamMessage>) -> bool {
    let Some(payload) = extract_data_payload(line) else {
        return false;
    };

    if payload == "[DONE]" {
        let _ = tx.send(StreamMessage::End);
        return true;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => {
            if let Some(choice) = response.choices.first() {
                if let Some(content) = &choice.delta.content {
                    let _ = tx.send(StreamMessage::Chunk(content.clone()));
                }
            }
            false
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }

            // Providers deliver mid-stream failures as a JSON error body in
            // place of a delta frame.
            let _ = tx.send(StreamMessage::Error(format_api_error(payload)));
            let _ = tx.send(StreamMessage::End);
            true
        }
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                serde_json::Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    })
}

pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API error: <empty response>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return format!("API error: {summary}");
            }
        }
        if let Ok(pretty) = serde_json::to_string_pretty(&json_value) {
            return format!("API error:\n{pretty}");
        }
    }

    format!("API error: {trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (
        mpsc::UnboundedSender<StreamMessage>,
        mpsc::UnboundedReceiver<StreamMessage>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn sse_lines_with_and_without_space_yield_chunks() {
        let (tx, mut rx) = channel();

        for (line, expected) in [
            (r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#, "Hello"),
            (r#"data:{"choices":[{"delta":{"content":"World"}}]}"#, "World"),
        ] {
            assert!(!process_sse_line(line, &tx));
            match rx.try_recv().expect("expected chunk") {
                StreamMessage::Chunk(content) => assert_eq!(content, expected),
                other => panic!("expected chunk, got {other:?}"),
            }
        }
    }

    #[test]
    fn done_marker_ends_the_stream() {
        let (tx, mut rx) = channel();

        assert!(process_sse_line("data: [DONE]", &tx));
        assert!(matches!(rx.try_recv().unwrap(), StreamMessage::End));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn non_data_lines_are_ignored() {
        let (tx, mut rx) = channel();

        assert!(!process_sse_line(": keep-alive", &tx));
        assert!(!process_sse_line("event: ping", &tx));
        assert!(!process_sse_line("", &tx));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn error_frames_are_routed_then_the_stream_ends() {
        let (tx, mut rx) = channel();
        let line = r#"data: {"error":{"message":"internal server error"}}"#;

        assert!(process_sse_line(line, &tx));
        match rx.try_recv().unwrap() {
            StreamMessage::Error(text) => {
                assert_eq!(text, "API error: internal server error");
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert!(matches!(rx.try_recv().unwrap(), StreamMessage::End));
    }

    #[test]
    fn format_api_error_prefers_the_json_summary() {
        let raw = r#"{"error":{"message":"model   overloaded","type":"rate_limit"}}"#;
        assert_eq!(format_api_error(raw), "API error: model overloaded");

        let string_error = r#"{"error":"quota exceeded"}"#;
        assert_eq!(format_api_error(string_error), "API error: quota exceeded");
    }

    #[test]
    fn format_api_error_handles_non_json_bodies() {
        assert_eq!(format_api_error("  upstream timeout  "), "API error: upstream timeout");
        assert_eq!(format_api_error(""), "API error: <empty response>");
    }

    #[test]
    fn format_api_error_pretty_prints_json_without_summary() {
        let formatted = format_api_error(r#"{"status":"failed"}"#);
        assert!(formatted.starts_with("API error:\n"));
        assert!(formatted.contains("\"status\": \"failed\""));
    }
}
