//! Core protocol types for guessbox's wire format.
//!
//! Everything a room reads from or writes to a connection passes through
//! one shape, the [`Envelope`]: `{"type": .., "data": .., "from": ..}`.
//! The envelope is deliberately loose so that any well-formed JSON object
//! with a string `type` decodes; the closed enums [`ClientMessage`] and
//! [`ServerMessage`] are where the set of legal types is enforced.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies a player within a room.
///
/// Player ids are chosen by clients (or generated at admission), so
/// this is a string, not a number. `#[serde(transparent)]` keeps it a
/// bare JSON string on the wire.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for the empty id a client gets when it omits `from`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Names a room. Room ids are the codes players type in to join.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lets a `HashMap<RoomId, _>` be queried with a plain `&str`.
impl Borrow<str> for RoomId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A participant as a room sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub is_admin: bool,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, is_admin: bool) -> Self {
        Self {
            id: id.into(),
            is_admin,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope: the wire shape
// ---------------------------------------------------------------------------

/// The JSON object every frame carries.
///
/// ```json
/// {"type": "guess", "data": "alice", "from": "bob"}
/// ```
///
/// `data` and `from` default to `""` when a client leaves them out.
/// On the way out all three fields are always written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type. Named `kind` because `type` is a keyword.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub data: String,

    /// The sending player's id.
    #[serde(default)]
    pub from: String,
}

impl Envelope {
    pub fn new(
        kind: impl Into<String>,
        data: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
            from: from.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientMessage: what a client may send
// ---------------------------------------------------------------------------

/// A decoded inbound message.
///
/// Anything that is not one of these three is rejected by
/// `TryFrom<Envelope>` with [`ProtocolError::UnknownType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `start`: begin a new game, discarding any current one.
    Start { from: PlayerId },

    /// `guess`: name the player believed to be the current source.
    Guess { guess: PlayerId, from: PlayerId },

    /// `next`: append a fresh round to the current game.
    Next { from: PlayerId },
}

impl ClientMessage {
    /// The `from` the client claimed.
    pub fn sender(&self) -> &PlayerId {
        match self {
            Self::Start { from }
            | Self::Guess { from, .. }
            | Self::Next { from } => from,
        }
    }

    /// The wire `type` string, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Guess { .. } => "guess",
            Self::Next { .. } => "next",
        }
    }
}

impl TryFrom<Envelope> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        let from = PlayerId::from(envelope.from);
        match envelope.kind.as_str() {
            "start" => Ok(Self::Start { from }),
            "guess" => Ok(Self::Guess {
                guess: PlayerId::from(envelope.data),
                from,
            }),
            "next" => Ok(Self::Next { from }),
            _ => Err(ProtocolError::UnknownType(envelope.kind)),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage: what a room sends
// ---------------------------------------------------------------------------

/// How a guess compares with the current round's source player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct,
    Incorrect,
}

impl GuessOutcome {
    pub fn from_match(matched: bool) -> Self {
        if matched {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }
}

impl fmt::Display for GuessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound message, broadcast to a room or written to one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// `result`: the outcome of `from`'s guess.
    Result {
        outcome: GuessOutcome,
        from: PlayerId,
    },

    /// `system`: a room announcement such as "game started".
    System { text: String, from: PlayerId },

    /// `error`: a request that could not be served. Sent only to the
    /// member who asked.
    Error { reason: String },
}

impl ServerMessage {
    pub fn game_started(from: PlayerId) -> Self {
        Self::System {
            text: "game started".into(),
            from,
        }
    }

    pub fn round_started(from: PlayerId) -> Self {
        Self::System {
            text: "round started".into(),
            from,
        }
    }

    pub fn no_game_in_progress() -> Self {
        Self::Error {
            reason: "no game in progress".into(),
        }
    }
}

impl From<ServerMessage> for Envelope {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::Result { outcome, from } => {
                Envelope::new("result", outcome.as_str(), from.0)
            }
            ServerMessage::System { text, from } => {
                Envelope::new("system", text, from.0)
            }
            ServerMessage::Error { reason } => {
                Envelope::new("error", reason, "")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP bodies
// ---------------------------------------------------------------------------

/// Body of the room-creation call: `{"room": .., "password": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub room: RoomId,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
