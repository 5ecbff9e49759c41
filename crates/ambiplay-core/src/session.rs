//! Host-platform seam for media session discovery and control.

use std::fmt;

use thiserror::Error;

use crate::{RawSessionState, SessionCandidate, TransportCommand};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session bus request failed: {0}")]
    Bus(#[from] zbus::Error),
    #[error("media session unavailable: {0}")]
    Unavailable(String),
}

/// Which half of a session's state changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionTrigger {
    Metadata,
    Playback,
}

/// Access to the host's media sessions.
///
/// Implementations are driven by a single owner (the synchronizer), so the
/// returned futures do not need to be `Send`.
#[allow(async_fn_in_trait)]
pub trait SessionHost {
    /// Opaque handle to one host session.
    type Session: Clone + fmt::Debug + PartialEq;
    /// Live change registration on one session. Dropping it unregisters.
    type Listener;

    /// Current sessions in directory order with their last-known status.
    async fn list_sessions(&self) -> Result<Vec<SessionCandidate<Self::Session>>, SessionError>;

    /// Register for metadata and playback-state changes on `session`.
    async fn subscribe(&self, session: &Self::Session) -> Result<Self::Listener, SessionError>;

    /// Read the session's current metadata and playback state.
    async fn read_state(&self, session: &Self::Session) -> Result<RawSessionState, SessionError>;

    async fn send_command(
        &self,
        session: &Self::Session,
        command: TransportCommand,
    ) -> Result<(), SessionError>;
}
