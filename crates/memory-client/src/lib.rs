//! `vl-memory` — memory service client for VoiceLoop.
//!
//! Provides the [`MemoryProvider`] trait that abstracts over the memory
//! service HTTP API, a production REST implementation
//! ([`RestMemoryClient`]), and typed DTOs that decode the service's two
//! memory payload shapes once at the boundary.
//!
//! The client is retry-free: every call maps to exactly one HTTP request.
//! Attempt counting and backoff belong to the session layer's retry
//! executor.

pub mod provider;
pub mod rest;
pub mod types;

pub use provider::MemoryProvider;
pub use rest::RestMemoryClient;
pub use types::{AgentRecord, MemoryBlock};
