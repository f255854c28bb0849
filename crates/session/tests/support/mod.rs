//! Shared mocks for the session integration tests: a scriptable memory
//! service, a scriptable LLM provider, and a recording room transport.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vl_domain::error::{Error, Result};
use vl_domain::stream::{BoxStream, StreamEvent};
use vl_domain::transcript::TranscriptEvent;
use vl_memory::{AgentRecord, MemoryProvider};
use vl_providers::{ChatRequest, LlmProvider};
use vl_session::transport::RoomTransport;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Memory service mock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy)]
pub enum ProbeBehavior {
    Healthy,
    /// Consume the probe deadline, then report a timeout.
    TimeoutAfter(Duration),
}

#[derive(Debug, Clone)]
pub enum AskBehavior {
    Reply(String),
    /// Never answer; the per-attempt deadline fires.
    Hang,
}

pub struct MockMemory {
    pub probe_behavior: Mutex<ProbeBehavior>,
    pub ask_behavior: Mutex<AskBehavior>,
    pub record: Mutex<AgentRecord>,
    pub probe_calls: AtomicU32,
    pub ask_calls: AtomicU32,
    pub get_agent_calls: AtomicU32,
    pub appends: Mutex<Vec<(String, String)>>,
}

impl MockMemory {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            probe_behavior: Mutex::new(ProbeBehavior::Healthy),
            ask_behavior: Mutex::new(AskBehavior::Reply(text.to_owned())),
            record: Mutex::new(AgentRecord::default()),
            probe_calls: AtomicU32::new(0),
            ask_calls: AtomicU32::new(0),
            get_agent_calls: AtomicU32::new(0),
            appends: Mutex::new(Vec::new()),
        })
    }

    pub fn probe_timing_out(after: Duration) -> Arc<Self> {
        let mock = Self::replying("unreachable");
        *mock.probe_behavior.lock().unwrap() = ProbeBehavior::TimeoutAfter(after);
        mock
    }

    pub fn hanging() -> Arc<Self> {
        let mock = Self::replying("never");
        *mock.ask_behavior.lock().unwrap() = AskBehavior::Hang;
        mock
    }

    pub fn appended(&self) -> Vec<(String, String)> {
        self.appends.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemoryProvider for MockMemory {
    async fn probe(&self) -> Result<()> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.probe_behavior.lock().unwrap();
        match behavior {
            ProbeBehavior::Healthy => Ok(()),
            ProbeBehavior::TimeoutAfter(d) => {
                tokio::time::sleep(d).await;
                Err(Error::Timeout("health probe deadline".into()))
            }
        }
    }

    async fn get_agent(&self, _agent_id: &str) -> Result<AgentRecord> {
        self.get_agent_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.record.lock().unwrap().clone())
    }

    async fn ask(&self, _agent_id: &str, _user_text: &str) -> Result<String> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.ask_behavior.lock().unwrap().clone();
        match behavior {
            AskBehavior::Reply(text) => Ok(text),
            AskBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(86_400)).await;
                Err(Error::Timeout("unreachable".into()))
            }
        }
    }

    async fn append(&self, _agent_id: &str, user: &str, assistant: &str) -> Result<()> {
        self.appends
            .lock()
            .unwrap()
            .push((user.to_owned(), assistant.to_owned()));
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider mock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct MockLlm {
    pub reply: Mutex<String>,
    pub fail: AtomicBool,
    pub probe_ok: AtomicBool,
    pub chat_calls: AtomicU32,
    pub probe_calls: AtomicU32,
}

impl MockLlm {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(text.to_owned()),
            fail: AtomicBool::new(false),
            probe_ok: AtomicBool::new(true),
            chat_calls: AtomicU32::new(0),
            probe_calls: AtomicU32::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        let mock = Self::replying("unused");
        mock.fail.store(true, Ordering::SeqCst);
        mock
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn probe(&self) -> Result<()> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if self.probe_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Unreachable("mock provider down".into()))
        }
    }

    async fn chat_stream(
        &self,
        _req: ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Server {
                status: 500,
                message: "mock provider error".into(),
            });
        }

        let reply = self.reply.lock().unwrap().clone();
        let mid = reply.len() / 2;
        let events = vec![
            Ok(StreamEvent::Token {
                text: reply[..mid].to_owned(),
            }),
            Ok(StreamEvent::Token {
                text: reply[mid..].to_owned(),
            }),
            Ok(StreamEvent::Done {
                finish_reason: Some("stop".into()),
            }),
        ];
        Ok(Box::pin(futures_util::stream::iter(events)))
    }

    fn provider_id(&self) -> &str {
        "mock"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Transport mock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct MockTransport {
    pub transcripts: Mutex<Vec<TranscriptEvent>>,
    pub spoken: Mutex<Vec<String>>,
    pub cleared_rooms: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn transcript_log(&self) -> Vec<TranscriptEvent> {
        self.transcripts.lock().unwrap().clone()
    }

    pub fn spoken_log(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomTransport for MockTransport {
    async fn publish_transcript(&self, event: TranscriptEvent) -> Result<()> {
        self.transcripts.lock().unwrap().push(event);
        Ok(())
    }

    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_owned());
        Ok(())
    }

    async fn clear_stale_agents(&self, room_name: &str) -> Result<()> {
        self.cleared_rooms.lock().unwrap().push(room_name.to_owned());
        Ok(())
    }
}
