//! Rooms for guessbox.
//!
//! A [`Hub`] maps room ids to [`Room`]s. Each connection admitted to a
//! room gets a read loop that pushes raw frames into the room's inbox;
//! one dispatcher task per room drains the inbox, drives the [`Game`],
//! and fans results out to every member.
//!
//! ```text
//! gateway ──authorize──▶ Hub ──serve──▶ Room.join ─┐
//!                                                  ▼
//!    read loop (per connection) ──frame──▶ inbox ──▶ dispatcher ──▶ fan-out
//! ```
//!
//! # Key types
//!
//! - [`Hub`]: room table, admission, teardown
//! - [`Room`]: members, game, inbox
//! - [`Game`] / [`Round`]: the guessing state machine
//! - [`RoomConfig`]: inbox policy, write timeout, RNG seed, secret cost
//! - [`Catalog`]: where a round's reference [`Track`] comes from

mod catalog;
mod config;
mod dispatcher;
mod error;
mod game;
mod hub;
mod inbox;
mod room;
mod secret;

pub use catalog::{Catalog, NoCatalog, Track};
pub use config::{InboxPolicy, RoomConfig, SecretCost};
pub use error::RoomError;
pub use game::{Game, Round};
pub use hub::{Hub, anonymous_player};
pub use room::Room;
pub use secret::RoomSecret;
