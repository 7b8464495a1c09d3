use thiserror::Error;

/// Errors that can occur during peer communication.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Network I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The TCP connection was not established in time.
    #[error("connect timed out")]
    ConnectTimeout,

    /// A handshake read or message write did not finish in time.
    #[error("timeout")]
    Timeout,

    /// The peer's handshake was malformed.
    #[error("invalid handshake: {0}")]
    InvalidHandshake(&'static str),

    /// The peer's info hash doesn't match ours.
    #[error("info hash mismatch")]
    InfoHashMismatch,

    /// Received a malformed protocol message.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Received an unknown message ID.
    #[error("invalid message id: {0}")]
    InvalidMessageId(u8),

    /// The connection was closed by the peer.
    #[error("connection closed")]
    ConnectionClosed,

    /// The session has not completed its handshake, or was closed.
    #[error("session not ready")]
    NotReady,
}
