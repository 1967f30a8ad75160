//! Error types for the match layer.

use arenabot_records::RecordError;
use arenabot_session::SessionError;

/// Errors that can end a match early.
///
/// Every variant is fatal to the run: there is no resume after a broken
/// connection.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Records(#[from] RecordError),

    /// The decision engine task panicked or was cancelled.
    #[error("decision engine failed: {0}")]
    Engine(String),

    /// A phase transition that the match lifecycle does not allow.
    #[error("invalid match phase transition: {from} -> {to}")]
    InvalidPhase {
        from: crate::MatchPhase,
        to: crate::MatchPhase,
    },
}
