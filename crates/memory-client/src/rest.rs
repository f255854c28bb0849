//! REST implementation of [`MemoryProvider`].
//!
//! `RestMemoryClient` wraps a `reqwest::Client` and translates every trait
//! method into one HTTP call against the memory service. Status mapping:
//! 404 → `NotFound`, other non-2xx → `Server { status }` (retryability is
//! decided by `Error::is_retryable`), connect failures → `Unreachable`,
//! deadline misses → `Timeout`, body decode failures → `Protocol`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::time::Instant;
use uuid::Uuid;

use vl_domain::config::{MemoryConfig, ReliabilityConfig};
use vl_domain::error::{Error, Result};
use vl_domain::trace::TraceEvent;

use crate::provider::MemoryProvider;
use crate::types::{
    AgentDto, AgentRecord, MessagesRequest, MessagesResponse, OutgoingMessage,
};

/// Map a transport-level reqwest error into the domain taxonomy.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else if e.is_connect() {
        Error::Unreachable(e.to_string())
    } else if e.is_decode() {
        Error::Protocol(e.to_string())
    } else {
        Error::Unreachable(e.to_string())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST-based client for the memory service.
///
/// Created once per process and shared across sessions; the underlying
/// `reqwest::Client` maintains a connection pool.
#[derive(Debug, Clone)]
pub struct RestMemoryClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    probe_timeout: Duration,
}

impl RestMemoryClient {
    /// Build a new client from the memory and reliability config sections.
    ///
    /// The client-level timeout matches the per-attempt deadline so a hung
    /// socket cannot outlive the attempt that opened it; the retry executor
    /// remains the authority on attempt counting.
    pub fn new(cfg: &MemoryConfig, reliability: &ReliabilityConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(reliability.per_attempt_timeout())
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {e}")))?;

        let api_key = match &cfg.api_key_env {
            Some(var) => std::env::var(var).ok(),
            None => None,
        };

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key,
            probe_timeout: reliability.health_probe_timeout(),
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decorate a `RequestBuilder` with the standard agent headers.
    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        let trace_id = Uuid::new_v4().to_string();
        let mut rb = rb
            .header("X-Client-Type", "voiceloop-agent")
            .header("X-Trace-Id", &trace_id);
        if let Some(ref key) = self.api_key {
            rb = rb.header("Authorization", format!("Bearer {key}"));
        }
        rb
    }

    /// Send one request, emit a trace event, and map the status.
    async fn send(&self, endpoint: &str, rb: RequestBuilder) -> Result<Response> {
        let start = Instant::now();
        let result = self.decorate(rb).send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                TraceEvent::MemoryCall {
                    endpoint: endpoint.to_owned(),
                    status: 0,
                    duration_ms,
                }
                .emit();
                tracing::warn!(endpoint, error = %e, "memory service request failed");
                return Err(from_reqwest(e));
            }
        };

        let status = resp.status();
        TraceEvent::MemoryCall {
            endpoint: endpoint.to_owned(),
            status: status.as_u16(),
            duration_ms,
        }
        .emit();

        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(
            endpoint,
            status = status.as_u16(),
            "memory service returned an error status"
        );
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{endpoint}: {body}")));
        }
        Err(Error::Server {
            status: status.as_u16(),
            message: format!("{endpoint}: {body}"),
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MemoryProvider impl
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl MemoryProvider for RestMemoryClient {
    async fn probe(&self) -> Result<()> {
        let rb = self
            .http
            .get(self.url("/health"))
            .timeout(self.probe_timeout);
        self.send("/health", rb).await?;
        Ok(())
    }

    async fn get_agent(&self, agent_id: &str) -> Result<AgentRecord> {
        let path = format!("/agents/{agent_id}");
        let rb = self.http.get(self.url(&path));
        let resp = self.send(&path, rb).await?;
        let dto: AgentDto = resp.json().await.map_err(from_reqwest)?;
        Ok(dto.into())
    }

    async fn ask(&self, agent_id: &str, user_text: &str) -> Result<String> {
        let path = format!("/agents/{agent_id}/messages");
        let body = MessagesRequest {
            messages: vec![OutgoingMessage {
                role: "user",
                content: user_text.to_owned(),
            }],
        };
        let rb = self.http.post(self.url(&path)).json(&body);
        let resp = self.send(&path, rb).await?;
        let parsed: MessagesResponse = resp.json().await.map_err(from_reqwest)?;
        parsed
            .assistant_text()
            .ok_or_else(|| Error::Protocol(format!("{path}: no assistant message in response")))
    }

    async fn append(&self, agent_id: &str, user: &str, assistant: &str) -> Result<()> {
        let path = format!("/agents/{agent_id}/messages");
        let body = MessagesRequest {
            messages: vec![
                OutgoingMessage {
                    role: "user",
                    content: user.to_owned(),
                },
                OutgoingMessage {
                    role: "assistant",
                    content: assistant.to_owned(),
                },
            ],
        };
        let rb = self.http.post(self.url(&path)).json(&body);
        match self.send(&path, rb).await {
            Ok(_) => Ok(()),
            // The service deduplicates turns; a conflict means the pair is
            // already in the durable history.
            Err(Error::Server { status: 409, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
