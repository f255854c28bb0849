//! `vl-session` — the VoiceLoop orchestration core.
//!
//! One [`SessionController`] serves one room: it consumes participant
//! events and finalized user transcripts, routes each utterance through
//! the fast or memory path under the reliability envelope (retry executor,
//! per-dependency circuit breakers, response validation), publishes
//! transcripts, speaks the reply, and mirrors turns into the memory
//! service in the background.
//!
//! Process-wide, the [`RoomRegistry`] and [`DispatchGate`] enforce
//! at-most-one serving agent per room and at-most-one live session per
//! agent id.

pub mod breaker;
pub mod controller;
pub mod dispatch;
pub mod fastpath;
pub mod history;
pub mod loader;
pub mod registry;
pub mod retry;
pub mod sync;
pub mod transport;
pub mod turn;
pub mod validate;

pub use breaker::{BreakerStatus, CircuitBreaker};
pub use controller::{SessionController, SessionPhase, SessionState};
pub use dispatch::{DispatchDecision, DispatchGate, JobRequest};
pub use fastpath::FastPathGenerator;
pub use history::TurnHistory;
pub use loader::{AgentSnapshot, MemoryLoader};
pub use registry::{RoomAssignment, RoomRegistry};
pub use retry::RetryPolicy;
pub use sync::SyncWorker;
pub use transport::{Participant, ParticipantKind, RoomEvent, RoomTransport};
pub use turn::{TurnDeps, TurnOrchestrator};
