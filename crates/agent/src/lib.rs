//! `vl-agent` — the VoiceLoop worker process.
//!
//! Wires the process-wide singletons (agent binding, room registry,
//! memory client, optional fast-path provider, dispatch gate) and exposes
//! [`bootstrap::ProcessState::dispatch`] for the transport integration
//! that feeds jobs and room events into the core.

pub mod bootstrap;
pub mod cli;
