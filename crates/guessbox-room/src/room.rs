//! A room: a password-gated set of connections sharing one inbox, one
//! dispatcher, and at most one game.
//!
//! Membership and game state live behind a single async mutex. Writes
//! to members happen outside it: the dispatcher picks recipients under
//! the lock, releases it, then delivers to all of them concurrently,
//! each write bounded by the configured timeout.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use guessbox_protocol::{Codec, Envelope, JsonCodec, Player, RoomId, ServerMessage};
use guessbox_transport::{Connection, ConnectionId};
use futures_util::future::join_all;
use tokio::sync::{Mutex, Notify, watch};

use crate::inbox::{Frame, InboxTx, PushError};
use crate::{Game, RoomError, RoomSecret};

/// A connection admitted to a room, and who it speaks for.
pub(crate) struct Member<C> {
    pub conn: Arc<C>,
    pub player: Player,
    /// Wakes the member's read loop after the room drops it.
    pub evicted: Arc<Notify>,
}

/// Everything guarded by the room lock.
pub(crate) struct RoomState<C> {
    /// Keyed by connection id, which sorts in admission order.
    pub members: BTreeMap<ConnectionId, Member<C>>,
    pub game: Option<Game>,
}

impl<C> RoomState<C> {
    /// Every current member's connection, in admission order.
    pub fn everyone(&self) -> Vec<Arc<C>> {
        self.members.values().map(|m| Arc::clone(&m.conn)).collect()
    }

    /// Just `conn_id`'s connection, if it is still a member.
    pub fn only(&self, conn_id: ConnectionId) -> Vec<Arc<C>> {
        self.members
            .get(&conn_id)
            .map(|m| Arc::clone(&m.conn))
            .into_iter()
            .collect()
    }
}

/// A live room. Shared as `Arc<Room<C>>` by the hub and by each
/// member's read loop; the dispatcher only holds a `Weak`.
pub struct Room<C: Connection> {
    id: RoomId,
    secret: Option<RoomSecret>,
    closed: AtomicBool,
    pub(crate) state: Mutex<RoomState<C>>,
    inbox: InboxTx,
    shutdown: watch::Sender<bool>,
    write_timeout: Duration,
    codec: JsonCodec,
}

impl<C: Connection> fmt::Debug for Room<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<C: Connection> Room<C> {
    pub(crate) fn new(
        id: RoomId,
        secret: Option<RoomSecret>,
        inbox: InboxTx,
        shutdown: watch::Sender<bool>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            id,
            secret,
            closed: AtomicBool::new(false),
            state: Mutex::new(RoomState {
                members: BTreeMap::new(),
                game: None,
            }),
            inbox,
            shutdown,
            write_timeout,
            codec: JsonCodec,
        }
    }

    /// The code players join with.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// `None` for rooms that admit any password.
    pub fn secret(&self) -> Option<&RoomSecret> {
        self.secret.as_ref()
    }

    /// `true` once the last member has left. A closed room never
    /// reopens; the id gets a new room instead.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of admitted connections.
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.members.len()
    }

    /// Current members' players in admission order.
    pub async fn players(&self) -> Vec<Player> {
        let state = self.state.lock().await;
        state.members.values().map(|m| m.player.clone()).collect()
    }

    /// A snapshot of the game in progress, if any.
    pub async fn game(&self) -> Option<Game> {
        self.state.lock().await.game.clone()
    }

    /// Registers `conn` as a member. Fails if the room has closed.
    pub(crate) async fn join(
        &self,
        conn: Arc<C>,
        player: Player,
    ) -> Result<Arc<Notify>, RoomError> {
        let mut state = self.state.lock().await;
        if self.is_closed() {
            return Err(RoomError::NotFound(self.id.clone()));
        }
        let evicted = Arc::new(Notify::new());
        state.members.insert(
            conn.id(),
            Member {
                conn,
                player,
                evicted: Arc::clone(&evicted),
            },
        );
        Ok(evicted)
    }

    /// Drops the member, if still present, and reports whether the room
    /// is now empty. An empty room is marked closed before the lock is
    /// released.
    pub(crate) async fn leave(&self, conn_id: ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        state.members.remove(&conn_id);
        let empty = state.members.is_empty();
        if empty {
            self.closed.store(true, Ordering::Release);
        }
        empty
    }

    /// Queues a raw frame for the dispatcher.
    pub(crate) fn enqueue(&self, frame: Frame) -> Result<(), PushError> {
        self.inbox.push(frame)
    }

    /// Stops the dispatcher. Members stay connected until they leave.
    pub(crate) fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Writes `msg` to each connection in `to`, all at once and without
    /// the room lock, so a stalled member never delays the others or
    /// blocks admission. Members whose write fails or times out are
    /// evicted afterwards.
    ///
    /// Only the dispatcher delivers, and it waits for each delivery to
    /// finish, so every member still sees messages in dispatcher order.
    pub(crate) async fn deliver(&self, to: Vec<Arc<C>>, msg: ServerMessage) {
        if to.is_empty() {
            return;
        }
        let Some(frame) = self.encode(msg) else {
            return;
        };
        let writes = to.iter().map(|conn| self.write(conn.as_ref(), &frame));
        let failed: Vec<ConnectionId> = join_all(writes)
            .await
            .into_iter()
            .zip(&to)
            .filter(|(ok, _)| !ok)
            .map(|(_, conn)| conn.id())
            .collect();
        if !failed.is_empty() {
            self.evict(&failed).await;
        }
    }

    fn encode(&self, msg: ServerMessage) -> Option<Vec<u8>> {
        match self.codec.encode(&Envelope::from(msg)) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::error!(room_id = %self.id, error = %e, "failed to encode outbound message");
                None
            }
        }
    }

    async fn write(&self, conn: &C, frame: &[u8]) -> bool {
        let conn_id = conn.id();
        match tokio::time::timeout(self.write_timeout, conn.send(frame)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(room_id = %self.id, %conn_id, error = %e, "write failed");
                false
            }
            Err(_) => {
                tracing::warn!(room_id = %self.id, %conn_id, "write timed out");
                false
            }
        }
    }

    /// Drops the given members, wakes their read loops, and closes their
    /// transports. Closing happens after the lock is released.
    async fn evict(&self, conn_ids: &[ConnectionId]) {
        let evicted: Vec<Member<C>> = {
            let mut state = self.state.lock().await;
            conn_ids
                .iter()
                .filter_map(|conn_id| state.members.remove(conn_id))
                .collect()
        };
        for member in &evicted {
            tracing::warn!(
                room_id = %self.id,
                conn_id = %member.conn.id(),
                player_id = %member.player.id,
                "evicting connection"
            );
            member.evicted.notify_one();
        }
        let closes = evicted.iter().map(|member| {
            tokio::time::timeout(self.write_timeout, member.conn.close())
        });
        join_all(closes).await;
    }
}
