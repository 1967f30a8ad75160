//! Error types for the protocol layer.
//!
//! Classifying a line never fails (unknown shapes become
//! [`Event::Unrecognized`](crate::Event::Unrecognized)). Errors only arise
//! when a structured payload embedded in a line has to be decoded.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A JSON payload (move request, query response) could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The message is invalid at the protocol level.
    ///
    /// For payloads that decode fine but are unusable, e.g. an empty
    /// request payload where one is required.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
