//! In-process connection backed by Tokio channels.
//!
//! [`ChannelConnection::pair`] returns the bot-side connection plus a
//! [`RemoteEnd`] that plays the server: it pushes frames the bot will
//! receive and collects every line the bot sends.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, Mutex};

use crate::{Connection, ConnectionId, TransportError};

/// The bot-side half of an in-memory connection.
pub struct ChannelConnection {
    id: ConnectionId,
    inbound: Mutex<mpsc::UnboundedReceiver<String>>,
    outbound: mpsc::UnboundedSender<String>,
    closed: AtomicBool,
}

/// The server-side half of an in-memory connection.
pub struct RemoteEnd {
    to_client: mpsc::UnboundedSender<String>,
    from_client: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl ChannelConnection {
    /// Creates a connected pair.
    pub fn pair() -> (Self, RemoteEnd) {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();

        let conn = Self {
            id: ConnectionId::next(),
            inbound: Mutex::new(inbound),
            outbound,
            closed: AtomicBool::new(false),
        };
        let remote = RemoteEnd {
            to_client,
            from_client: Mutex::new(from_client),
        };
        (conn, remote)
    }
}

impl Connection for ChannelConnection {
    async fn send(&self, text: &str) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionClosed(format!(
                "{} already closed",
                self.id
            )));
        }
        self.outbound.send(text.to_string()).map_err(|_| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "remote end dropped",
            ))
        })
    }

    async fn recv(&self) -> Result<Option<String>, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(None);
        }
        Ok(self.inbound.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

impl RemoteEnd {
    /// Queues a frame for the bot to receive.
    ///
    /// Frames pushed after the bot side is dropped are discarded.
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.to_client.send(frame.into());
    }

    /// Waits for the next line the bot sends. `None` once the bot side is gone.
    pub async fn next_sent(&self) -> Option<String> {
        self.from_client.lock().await.recv().await
    }

    /// Drains every line the bot has sent so far without waiting.
    pub async fn sent(&self) -> Vec<String> {
        let mut rx = self.from_client.lock().await;
        let mut out = Vec::new();
        while let Ok(line) = rx.try_recv() {
            out.push(line);
        }
        out
    }
}
