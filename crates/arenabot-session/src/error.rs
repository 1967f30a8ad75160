//! Error types for the session layer.

use arenabot_protocol::ProtocolError;
use arenabot_transport::TransportError;

/// Errors that can occur while driving the server session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The account server refused the login or answered with a
    /// non-success status. Fatal to the session.
    #[error("login failed: {0}")]
    Login(String),

    /// The replay upload did not succeed. Only the save attempt is lost;
    /// the match it belongs to is already resolved.
    #[error("saving replay failed: {0}")]
    SaveReplay(String),

    /// The connection broke or was closed while we were waiting on it.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A payload from the server could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The HTTP request to the account server could not be made.
    #[error("account server request failed: {0}")]
    Http(#[from] reqwest::Error),
}
