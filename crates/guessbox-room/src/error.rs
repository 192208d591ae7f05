//! Error types for the room layer.

use guessbox_protocol::RoomId;

/// Errors that can occur during room operations.
///
/// Every variant is local to one admission or one creation call; none
/// of them affects other rooms or other members of the same room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room is registered under this id. A room that closed
    /// after its last member left reports this too.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The supplied password does not match the room's secret.
    #[error("invalid password for room {0}")]
    InvalidPassword(RoomId),

    /// A room with this id is already registered.
    #[error("room {0} already exists")]
    AlreadyExists(RoomId),

    /// The transport handshake failed; nothing was registered.
    #[error("connection upgrade failed: {0}")]
    UpgradeFailed(String),

    /// Hashing or verifying a room secret failed internally.
    #[error("room secret error: {0}")]
    Secret(String),
}
