//! `vl-domain` — shared types for the VoiceLoop voice agent core.
//!
//! Everything that crosses a crate boundary lives here: the configuration
//! tree, the error taxonomy, transcript and turn types, provider stream
//! events, and structured trace events.

pub mod config;
pub mod error;
pub mod stream;
pub mod trace;
pub mod transcript;
pub mod turn;

pub use error::{Error, RejectReason, Result};
