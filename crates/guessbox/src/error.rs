//! Unified error type for guessbox.

use guessbox_protocol::ProtocolError;
use guessbox_room::RoomError;
use guessbox_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GuessboxError {
    /// A transport-level error (send, recv, closed).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, bad password, already exists).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Binding or serving the listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
