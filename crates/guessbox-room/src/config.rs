//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings applied to every room a [`Hub`](crate::Hub) creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How the room's inbox buffers frames ahead of the dispatcher.
    pub inbox: InboxPolicy,

    /// Upper bound on a single write to a member. A write that takes
    /// longer counts as failed and the member is evicted.
    pub write_timeout: Duration,

    /// Seed for each dispatcher's RNG. `None` seeds from the OS, so
    /// source players differ run to run.
    pub seed: Option<u64>,

    /// Argon2 cost used when hashing room passwords.
    pub secret_cost: SecretCost,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            inbox: InboxPolicy::Unbounded,
            write_timeout: Duration::from_secs(10),
            seed: None,
            secret_cost: SecretCost::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// InboxPolicy
// ---------------------------------------------------------------------------

/// Buffering policy for a room's inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboxPolicy {
    /// Never rejects a frame.
    Unbounded,

    /// Holds at most `capacity` frames; a member whose frame does not fit
    /// is disconnected.
    Bounded { capacity: usize },
}

impl InboxPolicy {
    /// `Bounded` for `Some(capacity)`, `Unbounded` for `None`.
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(capacity) => Self::Bounded { capacity },
            None => Self::Unbounded,
        }
    }
}

// ---------------------------------------------------------------------------
// SecretCost
// ---------------------------------------------------------------------------

/// Argon2id cost parameters for room secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretCost {
    /// Memory size in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
}

impl SecretCost {
    /// The cheapest parameters Argon2 accepts. Only for tests.
    pub fn minimal() -> Self {
        Self {
            memory_kib: argon2::Params::MIN_M_COST,
            iterations: argon2::Params::MIN_T_COST,
        }
    }
}

impl Default for SecretCost {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
        }
    }
}
