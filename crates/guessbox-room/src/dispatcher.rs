//! The per-room dispatcher task.
//!
//! Drains the room's inbox one frame at a time, decodes it, applies it
//! to the game, and fans the result out. It is the only writer of a
//! room's game, and because it handles one frame at a time, every member
//! sees the same order.

use std::sync::{Arc, Weak};

use guessbox_protocol::{ClientMessage, Codec, Envelope, JsonCodec, ServerMessage};
use guessbox_transport::Connection;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::inbox::{Frame, InboxRx};
use crate::{Catalog, Game, Room};

/// Spawns the dispatcher for `room`.
///
/// The task ends when the room is shut down or dropped, or when its
/// inbox has no producers left.
pub(crate) fn spawn<C: Connection>(
    room: &Arc<Room<C>>,
    inbox: InboxRx,
    shutdown: watch::Receiver<bool>,
    catalog: Arc<dyn Catalog>,
    seed: Option<u64>,
) -> JoinHandle<()> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let room = Arc::downgrade(room);
    tokio::spawn(run(room, inbox, shutdown, catalog, rng))
}

async fn run<C: Connection>(
    room: Weak<Room<C>>,
    mut inbox: InboxRx,
    mut shutdown: watch::Receiver<bool>,
    catalog: Arc<dyn Catalog>,
    mut rng: StdRng,
) {
    let room_id = match room.upgrade() {
        Some(room) => room.id().clone(),
        None => return,
    };
    tracing::info!(%room_id, "dispatcher started");

    loop {
        let frame = tokio::select! {
            frame = inbox.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
            // Fires on shutdown, and also when the room (which owns the
            // sender) is dropped.
            _ = shutdown.wait_for(|stop| *stop) => break,
        };
        let Some(room) = room.upgrade() else {
            break;
        };
        dispatch(&room, frame, &mut rng, catalog.as_ref()).await;
    }

    tracing::info!(%room_id, "dispatcher stopped");
}

/// Handles one inbound frame.
pub(crate) async fn dispatch<C: Connection>(
    room: &Room<C>,
    frame: Frame,
    rng: &mut StdRng,
    catalog: &dyn Catalog,
) {
    let room_id = room.id();
    let conn_id = frame.conn;

    let envelope: Envelope = match JsonCodec.decode(&frame.data) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(%room_id, %conn_id, error = %e, "dropping undecodable frame");
            return;
        }
    };
    let msg = match ClientMessage::try_from(envelope) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(%room_id, %conn_id, error = %e, "dropping frame");
            return;
        }
    };

    // Recipients are picked under the lock; delivery happens after it is
    // released.
    let (to, reply) = {
        let mut state = room.state.lock().await;

        // Outbound `from` names the sender as admitted, not as claimed.
        let sender = state
            .members
            .get(&conn_id)
            .map(|m| m.player.id.clone())
            .unwrap_or_else(|| msg.sender().clone());

        match msg {
            ClientMessage::Start { .. } => {
                let players =
                    state.members.values().map(|m| m.player.clone()).collect();
                let Some(game) = Game::start(players, rng, catalog) else {
                    tracing::info!(%room_id, %conn_id, "start ignored: no players in room");
                    return;
                };
                tracing::info!(
                    %room_id,
                    player_id = %sender,
                    players = game.players().len(),
                    source = %game.current_round().source().id,
                    "game started"
                );
                state.game = Some(game);
                (state.everyone(), ServerMessage::game_started(sender))
            }
            ClientMessage::Guess { guess, .. } => match state.game.as_mut() {
                Some(game) => {
                    let outcome = game.guess(&sender, &guess);
                    tracing::debug!(%room_id, player_id = %sender, %guess, %outcome, "guess scored");
                    (state.everyone(), ServerMessage::Result { outcome, from: sender })
                }
                None => {
                    tracing::debug!(%room_id, %conn_id, "guess without a game");
                    (state.only(conn_id), ServerMessage::no_game_in_progress())
                }
            },
            ClientMessage::Next { .. } => match state.game.as_mut() {
                Some(game) => {
                    let round = game.next_round(rng, catalog);
                    tracing::info!(
                        %room_id,
                        player_id = %sender,
                        source = %round.source().id,
                        "round started"
                    );
                    (state.everyone(), ServerMessage::round_started(sender))
                }
                None => {
                    tracing::debug!(%room_id, %conn_id, "next without a game");
                    (state.only(conn_id), ServerMessage::no_game_in_progress())
                }
            },
        }
    };

    room.deliver(to, reply).await;
}
