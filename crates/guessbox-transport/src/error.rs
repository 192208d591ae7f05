use crate::ConnectionId;

/// Failure on a single connection. Never fatal beyond that connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer is gone, or the connection was closed locally.
    #[error("{0} is closed")]
    Closed(ConnectionId),

    #[error("write to {conn} failed: {reason}")]
    WriteFailed { conn: ConnectionId, reason: String },

    #[error("read from {conn} failed: {reason}")]
    ReadFailed { conn: ConnectionId, reason: String },
}
