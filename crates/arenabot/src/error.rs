//! Unified error type for the arena bot.

use arenabot_protocol::ProtocolError;
use arenabot_records::RecordError;
use arenabot_room::RoomError;
use arenabot_session::SessionError;
use arenabot_transport::TransportError;

use crate::challenge::NegotiationState;
use crate::teams::TeamError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Login refusal, broken connection, HTTP failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Records(#[from] RecordError),

    #[error(transparent)]
    Team(#[from] TeamError),

    /// The configuration is unusable; reported before connecting.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("negotiation cannot move from {from:?} to {to:?}")]
    InvalidNegotiation {
        from: NegotiationState,
        to: NegotiationState,
    },

    #[error("could not read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
