//! Client connection over `tokio-tungstenite`.
//!
//! The socket is split so a pending receive never holds up a send: the
//! write half and the read half sit behind their own locks.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, TransportError};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The bot's connection to the arena server.
pub struct WebSocketConnection {
    id: ConnectionId,
    writer: Mutex<SplitSink<Socket, Message>>,
    reader: Mutex<SplitStream<Socket>>,
}

impl WebSocketConnection {
    /// Connects to `url`, e.g. `ws://sim.example.com:8000/showdown/websocket`.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (socket, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectFailed {
                addr: url.to_string(),
                source: as_io(std::io::ErrorKind::ConnectionRefused, e),
            })?;

        let id = ConnectionId::next();
        tracing::debug!(%id, url, "websocket open");

        let (writer, reader) = socket.split();
        Ok(Self {
            id,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }
}

fn as_io(kind: std::io::ErrorKind, e: tungstenite::Error) -> std::io::Error {
    match e {
        tungstenite::Error::Io(io) => io,
        other => std::io::Error::new(kind, other),
    }
}

impl Connection for WebSocketConnection {
    async fn send(&self, text: &str) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .send(Message::text(text))
            .await
            .map_err(|e| TransportError::SendFailed(as_io(std::io::ErrorKind::BrokenPipe, e)))
    }

    /// Text and binary frames both come back as text; control frames are
    /// skipped.
    async fn recv(&self) -> Result<Option<String>, TransportError> {
        let mut reader = self.reader.lock().await;
        while let Some(frame) = reader.next().await {
            match frame {
                Ok(Message::Text(text)) => return Ok(Some(text.as_str().to_owned())),
                Ok(Message::Binary(data)) => {
                    return Ok(Some(String::from_utf8_lossy(&data).into_owned()));
                }
                Ok(Message::Close(close)) => {
                    tracing::debug!(id = %self.id, ?close, "server closed websocket");
                    return Ok(None);
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => {
                    return Err(TransportError::ReceiveFailed(as_io(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::SendFailed(as_io(std::io::ErrorKind::BrokenPipe, e)))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
