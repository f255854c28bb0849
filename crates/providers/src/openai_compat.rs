//! OpenAI-compatible streaming adapter.
//!
//! Works with OpenAI and any endpoint following the chat completions
//! contract (vLLM, Ollama, LM Studio, Together). The fast path never sends
//! tool definitions; the request body is messages + model + temperature
//! with `stream: true`.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::time::Instant;

use vl_domain::config::{LlmConfig, ReliabilityConfig};
use vl_domain::error::{Error, Result};
use vl_domain::stream::{BoxStream, StreamEvent};
use vl_domain::trace::TraceEvent;
use vl_domain::transcript::Role;

use crate::traits::{ChatMessage, ChatRequest, LlmProvider};
use crate::util::from_reqwest;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An LLM provider adapter for any OpenAI-compatible API endpoint.
pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key: Option<String>,
    default_model: String,
    default_temperature: f32,
    probe_timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new provider from the deserialized config.
    ///
    /// The credential comes from `api_key` (inline, tests) or the
    /// `api_key_env` environment variable. A missing key is not an error
    /// here: local endpoints often need none, and hosted ones will reject
    /// the first call with a 401 that the reliability envelope absorbs.
    pub fn from_config(cfg: &LlmConfig, reliability: &ReliabilityConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .or_else(|| std::env::var(&cfg.api_key_env).ok());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            id: cfg.id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model: cfg.model.clone(),
            default_temperature: cfg.temperature,
            probe_timeout: reliability.health_probe_timeout(),
            client,
        })
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn authed(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => rb.header("Authorization", format!("Bearer {key}")),
            None => rb,
        }
    }

    fn effective_model(&self, req: &ChatRequest) -> String {
        req.model
            .clone()
            .unwrap_or_else(|| self.default_model.clone())
    }

    fn build_chat_body(&self, req: &ChatRequest) -> Value {
        let messages: Vec<Value> = req.messages.iter().map(msg_to_openai).collect();
        serde_json::json!({
            "model": self.effective_model(req),
            "messages": messages,
            "temperature": req.temperature.unwrap_or(self.default_temperature),
            "stream": true,
        })
    }
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn msg_to_openai(msg: &ChatMessage) -> Value {
    serde_json::json!({
        "role": role_to_str(msg.role),
        "content": msg.content,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SSE line decoding
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Incremental decoder for an SSE response body.
///
/// OpenAI-style endpoints put a whole event on a single `data:` line, so
/// the decoder works at line granularity: each raw chunk is appended to a
/// carry buffer, and every line completed by that chunk is checked for a
/// `data:` prefix. `event:`, `id:`, `retry:`, comment lines and the blank
/// event separators carry nothing for this wire format and are dropped.
struct SseLineDecoder {
    pending: String,
}

impl SseLineDecoder {
    fn new() -> Self {
        Self {
            pending: String::new(),
        }
    }

    /// Absorb one body chunk and return the payload of every `data:` line
    /// it completed.
    fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(chunk));

        let mut payloads = Vec::new();
        while let Some(nl) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=nl).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Take the final unterminated line, if the body ended without one.
    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        data_payload(&rest)
    }
}

fn data_payload(line: &str) -> Option<String> {
    let payload = line
        .trim_end_matches(['\n', '\r'])
        .strip_prefix("data:")?
        .trim();
    if payload.is_empty() {
        None
    } else {
        Some(payload.to_owned())
    }
}

/// Parse one `data:` payload into stream events.
///
/// `[DONE]` is the OpenAI end-of-stream sentinel. Malformed payloads are
/// skipped rather than failing the turn: a single bad chunk should not
/// discard the tokens already assembled.
fn parse_stream_data(data: &str) -> Vec<Result<StreamEvent>> {
    if data == "[DONE]" {
        return vec![Ok(StreamEvent::Done {
            finish_reason: None,
        })];
    }

    let value: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed stream chunk");
            return Vec::new();
        }
    };

    let mut events = Vec::new();
    if let Some(choice) = value["choices"].get(0) {
        if let Some(text) = choice["delta"]["content"].as_str() {
            if !text.is_empty() {
                events.push(Ok(StreamEvent::Token {
                    text: text.to_string(),
                }));
            }
        }
        if let Some(reason) = choice["finish_reason"].as_str() {
            events.push(Ok(StreamEvent::Done {
                finish_reason: Some(reason.to_string()),
            }));
        }
    }
    events
}

/// Turn an SSE response body into a stream of [`StreamEvent`]s.
///
/// Ends as soon as a `Done` event is yielded; if the body closes without
/// one, a synthetic `Done` terminates the stream so consumers always see
/// an end marker.
fn event_stream(response: reqwest::Response) -> BoxStream<'static, Result<StreamEvent>> {
    let stream = async_stream::stream! {
        let mut body = response.bytes_stream();
        let mut decoder = SseLineDecoder::new();

        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(from_reqwest(e));
                    return;
                }
            };
            for payload in decoder.feed(&bytes) {
                for event in parse_stream_data(&payload) {
                    let done = matches!(&event, Ok(StreamEvent::Done { .. }));
                    yield event;
                    if done {
                        return;
                    }
                }
            }
        }

        if let Some(payload) = decoder.finish() {
            for event in parse_stream_data(&payload) {
                let done = matches!(&event, Ok(StreamEvent::Done { .. }));
                yield event;
                if done {
                    return;
                }
            }
        }

        yield Ok(StreamEvent::Done {
            finish_reason: Some("stop".into()),
        });
    };

    Box::pin(stream)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LlmProvider impl
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn probe(&self) -> Result<()> {
        let url = format!("{}/models", self.base_url);
        let resp = self
            .authed(self.client.get(&url))
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(from_reqwest)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Server {
                status: resp.status().as_u16(),
                message: format!("/models probe failed for {}", self.id),
            })
        }
    }

    async fn chat_stream(
        &self,
        req: ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_chat_body(&req);
        let model = self.effective_model(&req);

        let start = Instant::now();
        let resp = self
            .authed(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        TraceEvent::LlmRequest {
            provider: self.id.clone(),
            model,
            streaming: true,
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(event_stream(resp))
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    // ── Line decoding ──────────────────────────────────────────────

    #[test]
    fn decoder_yields_payload_per_completed_line() {
        let mut d = SseLineDecoder::new();
        let payloads = d.feed(b"data: alpha\ndata: beta\n");
        assert_eq!(payloads, vec!["alpha", "beta"]);
    }

    #[test]
    fn decoder_carries_partial_line_across_chunks() {
        let mut d = SseLineDecoder::new();
        assert!(d.feed(b"data: spl").is_empty());
        assert!(d.feed(b"it-pay").is_empty());
        let payloads = d.feed(b"load\n");
        assert_eq!(payloads, vec!["split-payload"]);
    }

    #[test]
    fn decoder_strips_crlf_line_endings() {
        let mut d = SseLineDecoder::new();
        let payloads = d.feed(b"data: windows\r\n");
        assert_eq!(payloads, vec!["windows"]);
    }

    #[test]
    fn decoder_drops_non_data_lines_and_separators() {
        let mut d = SseLineDecoder::new();
        let payloads = d.feed(b"event: ping\nid: 7\nretry: 500\n: comment\n\ndata: real\n");
        assert_eq!(payloads, vec!["real"]);
    }

    #[test]
    fn decoder_skips_empty_data_lines() {
        let mut d = SseLineDecoder::new();
        assert!(d.feed(b"data:\ndata:   \n").is_empty());
    }

    #[test]
    fn decoder_finish_flushes_unterminated_tail() {
        let mut d = SseLineDecoder::new();
        assert!(d.feed(b"data: tail-without-newline").is_empty());
        assert_eq!(d.finish().as_deref(), Some("tail-without-newline"));
        // A second finish has nothing left.
        assert!(d.finish().is_none());
    }

    #[test]
    fn decoder_chunk_spanning_many_events() {
        let mut d = SseLineDecoder::new();
        let mut payloads = d.feed(b"data: one\n\ndata: two\n\ndata: thr");
        payloads.extend(d.feed(b"ee\n"));
        assert_eq!(payloads, vec!["one", "two", "three"]);
    }

    // ── Event parsing ──────────────────────────────────────────────

    #[test]
    fn token_delta_parses() {
        let events =
            parse_stream_data(r#"{"choices":[{"delta":{"content":"Hel"},"index":0}]}"#);
        assert_eq!(events.len(), 1);
        assert!(
            matches!(&events[0], Ok(StreamEvent::Token { text }) if text == "Hel")
        );
    }

    #[test]
    fn done_sentinel_parses() {
        let events = parse_stream_data("[DONE]");
        assert!(matches!(&events[0], Ok(StreamEvent::Done { .. })));
    }

    #[test]
    fn finish_reason_becomes_done() {
        let events =
            parse_stream_data(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Ok(StreamEvent::Done { finish_reason: Some(r) }) if r == "stop"
        ));
    }

    #[test]
    fn role_only_delta_yields_nothing() {
        let events = parse_stream_data(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#);
        assert!(events.is_empty());
    }

    #[test]
    fn malformed_chunk_is_skipped() {
        let events = parse_stream_data("{not json");
        assert!(events.is_empty());
    }

    // ── Request shaping ────────────────────────────────────────────

    #[test]
    fn body_shape_is_text_only() {
        let provider = OpenAiCompatProvider::from_config(
            &LlmConfig {
                api_key: Some("sk-test".into()),
                ..LlmConfig::default()
            },
            &ReliabilityConfig::default(),
        )
        .unwrap();

        let body = provider.build_chat_body(&ChatRequest {
            messages: vec![
                ChatMessage::system("You are Ivy."),
                ChatMessage::user("hello"),
            ],
            model: None,
            temperature: None,
        });

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        // The fast path never sends tool definitions.
        assert!(body.get("tools").is_none());
    }
}
