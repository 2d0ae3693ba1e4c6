//! Session management core module.
//!
//! This module provides the per-connection state machine and everything one
//! session exclusively owns: its identity and timestamps, its crossing
//! counter, its recorder and its event log.

use serde::{Deserialize, Serialize};

/// Submodule for the frame processing stages run for each stream message.
pub mod pipeline;
/// Submodule for session data structures.
pub mod session;
/// Submodule for the connection state machine.
pub mod session_controller;
/// Submodule for the per-session event log.
pub mod session_log;
#[cfg(test)]
mod tests;

pub use pipeline::{FrameOutcome, FramePipeline};
pub use session::{Session, SessionIdentity};
pub use session_controller::{SessionContext, SessionController, SessionReport};
pub use session_log::{LogEntry, SessionLog};

/// Represents the current state of a session.
///
/// States only move forward, in declaration order:
/// - `AwaitingHandshake`: connected, waiting for the identity + first frame message.
/// - `Streaming`: every inbound message triggers processing of the latest frame.
/// - `Closing`: finalizing the recording, the log and the backend report.
/// - `Closed`: terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionState {
    AwaitingHandshake,
    Streaming,
    Closing,
    Closed,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_advance_to(self, next: SessionState) -> bool {
        next > self
    }
}
