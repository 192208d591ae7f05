//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means a frame could not be turned into (or
//! out of) a message. Rooms treat it as recoverable: the frame is
//! dropped and the dispatcher moves on.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes are not a well-formed envelope (malformed JSON, a
    /// missing `type`, a non-string field).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope decoded, but its `type` is not one a client may send.
    ///
    /// Covers both unknown strings and outbound-only types such as
    /// `result` echoed back by a client.
    #[error("unknown message type: {0:?}")]
    UnknownType(String),
}
