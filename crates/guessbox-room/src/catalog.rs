//! The seam to the music catalog.
//!
//! A round can carry a reference track taken from its source player's
//! library. Fetching it is someone else's job; rooms only ask.

use guessbox_protocol::Player;
use serde::{Deserialize, Serialize};

/// An opaque reference item shown to guessers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
}

/// Supplies the reference track for a new round.
///
/// Called from the dispatcher while the room lock is held, so
/// implementations must answer from memory and not block.
pub trait Catalog: Send + Sync + 'static {
    fn reference_track(&self, source: &Player) -> Option<Track>;
}

/// A catalog with nothing in it. Rounds carry no track.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

impl Catalog for NoCatalog {
    fn reference_track(&self, _source: &Player) -> Option<Track> {
        None
    }
}
