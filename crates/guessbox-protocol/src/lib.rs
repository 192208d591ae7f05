//! Wire protocol for guessbox.
//!
//! This crate defines what clients and rooms say to each other:
//!
//! - **Types** ([`Envelope`], [`ClientMessage`], [`ServerMessage`],
//!   [`PlayerId`], [`RoomId`]): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   become frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong in between.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and rooms
//! (game state). It knows nothing about connections or locks.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope → ClientMessage) → Room dispatcher
//! Room dispatcher → Protocol (ServerMessage → Envelope) → Transport (bytes)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, CreateRoomRequest, Envelope, GuessOutcome, Player,
    PlayerId, RoomId, ServerMessage,
};
