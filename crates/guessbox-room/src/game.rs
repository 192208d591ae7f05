//! The round-based guessing game.
//!
//! A [`Game`] is a snapshot of the room's players plus an append-only
//! list of [`Round`]s. Each round names one source player at random;
//! the others try to guess who it is. The dispatcher is the only code
//! that mutates a game.

use guessbox_protocol::{GuessOutcome, Player, PlayerId};
use rand::Rng;

use crate::{Catalog, Track};

/// One guessing cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    source: Player,
    track: Option<Track>,
    winner: Option<PlayerId>,
}

impl Round {
    fn new(source: Player, catalog: &dyn Catalog) -> Self {
        let track = catalog.reference_track(&source);
        Self {
            source,
            track,
            winner: None,
        }
    }

    /// The player whose identity must be guessed.
    pub fn source(&self) -> &Player {
        &self.source
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    /// The first player who guessed correctly. Never changes once set.
    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }
}

/// A game in progress.
///
/// The current round is held apart from the finished ones, so a game
/// always has at least one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    players: Vec<Player>,
    finished: Vec<Round>,
    current: Round,
}

impl Game {
    /// Starts a game over `players` (in admission order) with a first
    /// round already drawn. Returns `None` when there is nobody to play.
    pub fn start(
        players: Vec<Player>,
        rng: &mut impl Rng,
        catalog: &dyn Catalog,
    ) -> Option<Self> {
        let source = pick_source(&players, rng)?;
        let current = Round::new(source, catalog);
        Some(Self {
            players,
            finished: Vec::new(),
            current,
        })
    }

    /// Appends a round with a freshly drawn source from the same players.
    pub fn next_round(
        &mut self,
        rng: &mut impl Rng,
        catalog: &dyn Catalog,
    ) -> &Round {
        if let Some(source) = pick_source(&self.players, rng) {
            let round = Round::new(source, catalog);
            let done = std::mem::replace(&mut self.current, round);
            self.finished.push(done);
        }
        &self.current
    }

    /// Scores `guess` by `guesser` against the current round.
    ///
    /// The first correct guesser becomes the round's winner.
    pub fn guess(&mut self, guesser: &PlayerId, guess: &PlayerId) -> GuessOutcome {
        let outcome = GuessOutcome::from_match(*guess == self.current.source.id);
        if outcome == GuessOutcome::Correct && self.current.winner.is_none() {
            self.current.winner = Some(guesser.clone());
        }
        outcome
    }

    /// Players snapshotted when the game started.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_round(&self) -> &Round {
        &self.current
    }

    /// All rounds, oldest first. The last one is current.
    pub fn rounds(&self) -> impl Iterator<Item = &Round> {
        self.finished.iter().chain(std::iter::once(&self.current))
    }

    pub fn round_count(&self) -> usize {
        self.finished.len() + 1
    }
}

fn pick_source(players: &[Player], rng: &mut impl Rng) -> Option<Player> {
    if players.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..players.len());
    players.get(idx).cloned()
}
