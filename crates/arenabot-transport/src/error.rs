/// What can go wrong with a text-frame connection.
///
/// Every variant is fatal to the connection: there is no reconnect.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server could not be reached or refused the upgrade.
    #[error("could not connect to {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The other side hung up, with its close reason if it gave one.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    #[error("could not write frame: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("could not read frame: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
