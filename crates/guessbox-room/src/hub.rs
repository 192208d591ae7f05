//! The hub: the process-wide table of rooms, and the entry point for
//! admitting connections.

use std::collections::HashMap;
use std::sync::Arc;

use guessbox_protocol::{Player, PlayerId, RoomId};
use guessbox_transport::Connection;
use parking_lot::Mutex;
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::sync::{Notify, watch};

use crate::inbox::{self, Frame};
use crate::{Catalog, NoCatalog, Room, RoomConfig, RoomError, RoomSecret, dispatcher};

/// Registry of live rooms.
///
/// The table lock is a plain `parking_lot` mutex: it is never held
/// across an `.await`, and password hashing happens before it is taken.
pub struct Hub<C: Connection> {
    rooms: Mutex<HashMap<RoomId, Arc<Room<C>>>>,
    config: RoomConfig,
    catalog: Arc<dyn Catalog>,
    /// Verified against when a room is unknown, so a miss costs the same
    /// as a wrong password.
    decoy: RoomSecret,
}

impl<C: Connection> Hub<C> {
    /// Creates an empty hub whose rooms use `config` and carry no tracks.
    pub fn new(config: RoomConfig) -> Result<Self, RoomError> {
        Self::with_catalog(config, Arc::new(NoCatalog))
    }

    /// Like [`Hub::new`], but each new round asks `catalog` for a
    /// reference track.
    ///
    /// # Errors
    /// [`RoomError::Secret`] if the decoy secret cannot be hashed with
    /// `config.secret_cost`.
    pub fn with_catalog(
        config: RoomConfig,
        catalog: Arc<dyn Catalog>,
    ) -> Result<Self, RoomError> {
        let decoy = RoomSecret::hash(&random_token(24), config.secret_cost)?;
        Ok(Self {
            rooms: Mutex::new(HashMap::new()),
            config,
            catalog,
            decoy,
        })
    }

    /// The configuration every room in this hub is opened with.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Returns the live room for `id`, creating one that admits any
    /// password if there is none.
    ///
    /// Must be called from within a Tokio runtime; a new room's
    /// dispatcher is spawned immediately.
    pub fn get_or_create_room(&self, id: RoomId) -> Arc<Room<C>> {
        let mut rooms = self.rooms.lock();
        if let Some(room) = rooms.get(&id).filter(|r| !r.is_closed()) {
            return Arc::clone(room);
        }
        let room = self.open_room(id.clone(), None);
        if let Some(stale) = rooms.insert(id, Arc::clone(&room)) {
            stale.shutdown();
        }
        room
    }

    /// Registers a new room protected by `password`.
    ///
    /// # Errors
    /// [`RoomError::AlreadyExists`] if a live room has this id.
    pub async fn create_room(
        &self,
        id: RoomId,
        password: &str,
    ) -> Result<Arc<Room<C>>, RoomError> {
        if self.room(id.as_str()).is_some() {
            return Err(RoomError::AlreadyExists(id));
        }
        let secret =
            RoomSecret::hash_blocking(password.to_owned(), self.config.secret_cost)
                .await?;

        let mut rooms = self.rooms.lock();
        // Someone may have won the race while we were hashing.
        if rooms.get(&id).is_some_and(|r| !r.is_closed()) {
            return Err(RoomError::AlreadyExists(id));
        }
        let room = self.open_room(id.clone(), Some(secret));
        if let Some(stale) = rooms.insert(id, Arc::clone(&room)) {
            stale.shutdown();
        }
        Ok(room)
    }

    /// Ids of the currently registered rooms, in no particular order.
    pub fn list_room_ids(&self) -> Vec<RoomId> {
        self.rooms.lock().keys().cloned().collect()
    }

    /// Deregisters `id` and stops its dispatcher. No-op if absent.
    pub fn remove_room(&self, id: &str) {
        let removed = self.rooms.lock().remove(id);
        if let Some(room) = removed {
            room.shutdown();
            tracing::info!(room_id = %room.id(), "room removed");
        }
    }

    /// Looks up a live room.
    pub fn room(&self, id: &str) -> Option<Arc<Room<C>>> {
        self.rooms
            .lock()
            .get(id)
            .filter(|r| !r.is_closed())
            .cloned()
    }

    /// Resolves `id` and checks `password` against the room's secret.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if there is no live room, or
    /// [`RoomError::InvalidPassword`] if the password does not match.
    pub async fn authorize(
        &self,
        id: &str,
        password: &str,
    ) -> Result<Arc<Room<C>>, RoomError> {
        let Some(room) = self.room(id) else {
            let _ = self.decoy.verify_blocking(password.to_owned()).await?;
            return Err(RoomError::NotFound(RoomId::new(id)));
        };
        let Some(secret) = room.secret() else {
            return Ok(room);
        };
        if secret.verify_blocking(password.to_owned()).await? {
            Ok(room)
        } else {
            tracing::info!(room_id = %id, "rejected admission: invalid password");
            Err(RoomError::InvalidPassword(room.id().clone()))
        }
    }

    /// Admits `conn` to `room` as `player` and pumps its frames into the
    /// room's inbox until the connection closes, errors, or is evicted.
    ///
    /// Resolves once the connection has fully left. If it was the last
    /// member, the room is closed and deregistered.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the room closed before `conn` got in.
    pub async fn serve(
        &self,
        room: Arc<Room<C>>,
        conn: C,
        player: Player,
    ) -> Result<(), RoomError> {
        let conn = Arc::new(conn);
        let conn_id = conn.id();
        let room_id = room.id().clone();
        let player_id = player.id.clone();

        let evicted = match room.join(Arc::clone(&conn), player).await {
            Ok(evicted) => evicted,
            Err(e) => {
                let _ = conn.close().await;
                return Err(e);
            }
        };
        tracing::info!(%room_id, %conn_id, %player_id, "connection admitted");

        read_loop(&room, conn.as_ref(), &evicted).await;

        let empty = room.leave(conn_id).await;
        let _ = conn.close().await;
        tracing::info!(%room_id, %conn_id, %player_id, "connection left");

        if empty {
            self.remove_room_if(&room);
        }
        Ok(())
    }

    fn open_room(&self, id: RoomId, secret: Option<RoomSecret>) -> Arc<Room<C>> {
        let (inbox_tx, inbox_rx) = inbox::channel(self.config.inbox);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let room = Arc::new(Room::new(
            id,
            secret,
            inbox_tx,
            shutdown_tx,
            self.config.write_timeout,
        ));
        dispatcher::spawn(
            &room,
            inbox_rx,
            shutdown_rx,
            Arc::clone(&self.catalog),
            self.config.seed,
        );
        tracing::info!(room_id = %room.id(), protected = room.secret().is_some(), "room created");
        room
    }

    /// Deregisters `room`, but only if its id still maps to this very
    /// instance.
    fn remove_room_if(&self, room: &Arc<Room<C>>) {
        let mut rooms = self.rooms.lock();
        let same = rooms
            .get(room.id().as_str())
            .is_some_and(|current| Arc::ptr_eq(current, room));
        if same {
            rooms.remove(room.id().as_str());
            drop(rooms);
            room.shutdown();
            tracing::info!(room_id = %room.id(), "room closed");
        }
    }
}

/// Pushes each inbound frame, untouched, onto the room's inbox.
async fn read_loop<C: Connection>(room: &Room<C>, conn: &C, evicted: &Notify) {
    let room_id = room.id();
    let conn_id = conn.id();
    loop {
        let received = tokio::select! {
            received = conn.recv() => received,
            _ = evicted.notified() => {
                tracing::debug!(%room_id, %conn_id, "read loop ended: evicted");
                return;
            }
        };
        match received {
            Ok(Some(data)) => {
                if let Err(e) = room.enqueue(Frame { conn: conn_id, data }) {
                    tracing::warn!(%room_id, %conn_id, error = %e, "disconnecting producer");
                    return;
                }
            }
            Ok(None) => return,
            Err(e) => {
                tracing::debug!(%room_id, %conn_id, error = %e, "read failed");
                return;
            }
        }
    }
}

/// A player for a connection that did not name itself.
pub fn anonymous_player(is_admin: bool) -> Player {
    Player {
        id: PlayerId::new(format!("player-{}", random_token(8))),
        is_admin,
    }
}

fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
