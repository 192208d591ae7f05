//! # guessbox
//!
//! Real-time multiplayer guessing rooms over WebSocket.
//!
//! Players join a password-protected room, someone starts a game, and
//! each round one player is drawn at random as the source. Everyone else
//! guesses who it is; every guess is scored and broadcast to the room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use guessbox::prelude::*;
//!
//! # async fn start() -> Result<(), GuessboxError> {
//! let server = GuessboxServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
pub mod gateway;
pub mod logging;
mod server;
pub mod signal;

pub use error::GuessboxError;
pub use server::{GuessboxServer, GuessboxServerBuilder};

/// Everything needed to embed a server.
pub mod prelude {
    pub use crate::{GuessboxError, GuessboxServer, GuessboxServerBuilder};
    pub use guessbox_protocol::{Envelope, Player, PlayerId, RoomId};
    pub use guessbox_room::{
        Catalog, Hub, InboxPolicy, NoCatalog, RoomConfig, RoomError,
        SecretCost, Track,
    };
}
