//! Transport abstraction layer for the arena bot.
//!
//! Provides the [`Connection`] trait: a duplex channel of text frames.
//! The bot only ever holds one connection (to the arena server), so
//! there is no listener side here.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket client via `tokio-tungstenite`
//!
//! [`ChannelConnection`] is always available. It is an in-process
//! connection backed by Tokio channels, used to script server traffic.

#![allow(async_fn_in_trait)]

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{ChannelConnection, RemoteEnd};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection number, used to tag log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A duplex stream of text frames to the arena server.
///
/// Methods take `&self`; implementations lock internally.
pub trait Connection: Send + Sync + 'static {
    /// Sends one frame.
    async fn send(&self, text: &str) -> Result<(), TransportError>;

    /// Waits for the next frame; `Ok(None)` once the peer has closed.
    async fn recv(&self) -> Result<Option<String>, TransportError>;

    /// Receives the next frame, treating a clean close as an error.
    ///
    /// Everything above the transport waits on a live server; a closed
    /// socket there is just as fatal as a broken one.
    async fn recv_frame(&self) -> Result<String, TransportError> {
        match self.recv().await? {
            Some(frame) => Ok(frame),
            None => Err(TransportError::ConnectionClosed(format!(
                "{} closed by remote",
                self.id()
            ))),
        }
    }

    async fn close(&self) -> Result<(), TransportError>;

    fn id(&self) -> ConnectionId;
}
