//! Integration tests for the room system over in-memory connections.
//!
//! Every client here is a `MemoryPeer` whose server half is driven by
//! `Hub::serve` on its own task, just as the gateway does with a
//! WebSocket.

use std::sync::Arc;
use std::time::Duration;

use guessbox_protocol::{Envelope, Player};
use guessbox_room::{Catalog, Hub, RoomConfig, RoomError, SecretCost, Track};
use guessbox_transport::memory::{self, MemoryConnection, MemoryPeer};
use tokio::task::JoinHandle;

type TestHub = Arc<Hub<MemoryConnection>>;

// =========================================================================
// Helpers
// =========================================================================

fn config() -> RoomConfig {
    RoomConfig {
        seed: Some(7),
        secret_cost: SecretCost::minimal(),
        write_timeout: Duration::from_millis(500),
        ..RoomConfig::default()
    }
}

fn hub() -> TestHub {
    Arc::new(Hub::new(config()).unwrap())
}

struct Client {
    peer: MemoryPeer,
    task: JoinHandle<Result<(), RoomError>>,
}

impl Client {
    fn say(&self, json: &str) {
        assert!(self.peer.send(json.as_bytes().to_vec()), "peer hung up");
    }

    async fn next(&mut self) -> Envelope {
        let bytes = tokio::time::timeout(Duration::from_secs(2), self.peer.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("connection closed");
        serde_json::from_slice(&bytes).unwrap()
    }

    fn nothing_pending(&mut self) -> bool {
        self.peer.try_recv().is_none()
    }

    async fn hang_up(mut self) {
        self.peer.disconnect();
        tokio::time::timeout(Duration::from_secs(2), self.task)
            .await
            .expect("serve should finish")
            .unwrap()
            .unwrap();
    }
}

/// Authorizes, then serves a fresh connection as `player` and waits
/// until the room lists it.
async fn admit(
    hub: &TestHub,
    room: &str,
    password: &str,
    player: &str,
) -> Result<Client, RoomError> {
    let room = hub.authorize(room, password).await?;
    let (conn, peer) = memory::pair();

    let task = tokio::spawn({
        let hub = Arc::clone(hub);
        let room = Arc::clone(&room);
        let player = Player::new(player, false);
        async move { hub.serve(room, conn, player).await }
    });

    tokio::time::timeout(Duration::from_secs(2), async {
        while !room.players().await.iter().any(|p| p.id.as_str() == player) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("player should be admitted");

    Ok(Client { peer, task })
}

async fn source_of(hub: &TestHub, room: &str) -> String {
    let room = hub.room(room).unwrap();
    let game = room.game().await.expect("a game should be running");
    game.current_round().source().id.as_str().to_owned()
}

// =========================================================================
// Admission
// =========================================================================

#[tokio::test]
async fn test_same_password_admissions_share_room() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();

    let first = hub.authorize("R1", "pw1").await.unwrap();
    let second = hub.authorize("R1", "pw1").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let _a = admit(&hub, "R1", "pw1", "A").await.unwrap();
    let _b = admit(&hub, "R1", "pw1", "B").await.unwrap();
    assert_eq!(first.connection_count().await, 2);
}

#[tokio::test]
async fn test_wrong_password_leaves_members_untouched() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let mut a = admit(&hub, "R1", "pw1", "A").await.unwrap();

    let err = admit(&hub, "R1", "wrong", "Eve").await.err().unwrap();
    assert!(matches!(err, RoomError::InvalidPassword(_)));

    let room = hub.room("R1").unwrap();
    assert_eq!(room.players().await, vec![Player::new("A", false)]);
    a.say(r#"{"type":"start","from":"A"}"#);
    assert_eq!(a.next().await.data, "game started");
}

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    let hub = hub();
    let err = admit(&hub, "nope", "pw", "A").await.err().unwrap();
    assert!(matches!(err, RoomError::NotFound(id) if id.as_str() == "nope"));
}

#[tokio::test]
async fn test_list_room_ids_reports_created_rooms() {
    let hub = hub();
    hub.create_room("R1".into(), "pw").await.unwrap();
    hub.create_room("R2".into(), "pw").await.unwrap();

    let mut ids: Vec<String> = hub
        .list_room_ids()
        .into_iter()
        .map(|id| id.as_str().to_owned())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["R1", "R2"]);
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_last_disconnect_removes_room() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let a = admit(&hub, "R1", "pw1", "A").await.unwrap();
    let b = admit(&hub, "R1", "pw1", "B").await.unwrap();

    a.hang_up().await;
    assert!(hub.room("R1").is_some(), "room stays while B is in it");

    b.hang_up().await;
    assert!(!hub.list_room_ids().iter().any(|id| id.as_str() == "R1"));
    let err = admit(&hub, "R1", "pw1", "C").await.err().unwrap();
    assert!(matches!(err, RoomError::NotFound(_)));
}

#[tokio::test]
async fn test_room_id_reusable_after_close() {
    let hub = hub();
    hub.create_room("R1".into(), "old").await.unwrap();
    admit(&hub, "R1", "old", "A").await.unwrap().hang_up().await;

    hub.create_room("R1".into(), "new").await.unwrap();
    assert!(admit(&hub, "R1", "new", "B").await.is_ok());
}

#[tokio::test]
async fn test_failed_writer_is_evicted_and_skipped() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let mut a = admit(&hub, "R1", "pw1", "A").await.unwrap();
    let mut b = admit(&hub, "R1", "pw1", "B").await.unwrap();
    let mut c = admit(&hub, "R1", "pw1", "C").await.unwrap();

    b.peer.fail_writes();
    a.say(r#"{"type":"start","from":"A"}"#);
    assert_eq!(a.next().await.data, "game started");
    assert_eq!(c.next().await.data, "game started");

    tokio::time::timeout(Duration::from_secs(2), &mut b.task)
        .await
        .expect("evicted connection should be torn down")
        .unwrap()
        .unwrap();
    assert!(b.peer.is_closed());

    let room = hub.room("R1").unwrap();
    assert_eq!(
        room.players().await,
        vec![Player::new("A", false), Player::new("C", false)]
    );

    a.say(r#"{"type":"guess","data":"nobody","from":"A"}"#);
    assert_eq!(a.next().await.kind, "result");
    assert_eq!(c.next().await.kind, "result");
    assert!(b.nothing_pending());
}

// =========================================================================
// Game
// =========================================================================

#[tokio::test]
async fn test_start_then_correct_guess() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let mut a = admit(&hub, "R1", "pw1", "A").await.unwrap();
    let mut b = admit(&hub, "R1", "pw1", "B").await.unwrap();

    a.say(r#"{"type":"start","from":"A"}"#);
    let started = Envelope::new("system", "game started", "A");
    assert_eq!(a.next().await, started);
    assert_eq!(b.next().await, started);

    let source = source_of(&hub, "R1").await;
    assert!(source == "A" || source == "B");

    b.say(&format!(r#"{{"type":"guess","data":"{source}","from":"B"}}"#));
    let result = Envelope::new("result", "correct", "B");
    assert_eq!(a.next().await, result);
    assert_eq!(b.next().await, result);
}

#[tokio::test]
async fn test_incorrect_guess_broadcasts_incorrect() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let mut a = admit(&hub, "R1", "pw1", "A").await.unwrap();
    let mut b = admit(&hub, "R1", "pw1", "B").await.unwrap();

    a.say(r#"{"type":"start"}"#);
    a.next().await;
    b.next().await;

    let source = source_of(&hub, "R1").await;
    let wrong = if source == "A" { "B" } else { "A" };
    b.say(&format!(r#"{{"type":"guess","data":"{wrong}"}}"#));

    let result = Envelope::new("result", "incorrect", "B");
    assert_eq!(a.next().await, result);
    assert_eq!(b.next().await, result);
}

#[tokio::test]
async fn test_guess_before_start_sends_no_result() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let mut a = admit(&hub, "R1", "pw1", "A").await.unwrap();
    let mut b = admit(&hub, "R1", "pw1", "B").await.unwrap();

    a.say(r#"{"type":"guess","data":"B","from":"A"}"#);

    let reply = a.next().await;
    assert_eq!(reply, Envelope::new("error", "no game in progress", ""));
    assert!(b.nothing_pending());

    // The dispatcher is still alive.
    a.say(r#"{"type":"start","from":"A"}"#);
    assert_eq!(b.next().await.data, "game started");
}

#[tokio::test]
async fn test_next_appends_round() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let mut a = admit(&hub, "R1", "pw1", "A").await.unwrap();
    let mut b = admit(&hub, "R1", "pw1", "B").await.unwrap();

    a.say(r#"{"type":"start"}"#);
    a.next().await;
    b.next().await;
    b.say(r#"{"type":"next"}"#);

    let announced = Envelope::new("system", "round started", "B");
    assert_eq!(a.next().await, announced);
    assert_eq!(b.next().await, announced);

    let game = hub.room("R1").unwrap().game().await.unwrap();
    assert_eq!(game.round_count(), 2);
}

#[tokio::test]
async fn test_start_again_discards_rounds() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let mut a = admit(&hub, "R1", "pw1", "A").await.unwrap();

    a.say(r#"{"type":"start"}"#);
    a.say(r#"{"type":"next"}"#);
    a.say(r#"{"type":"next"}"#);
    for _ in 0..3 {
        a.next().await;
    }
    let room = hub.room("R1").unwrap();
    assert_eq!(room.game().await.unwrap().round_count(), 3);

    a.say(r#"{"type":"start"}"#);
    a.next().await;
    assert_eq!(room.game().await.unwrap().round_count(), 1);
}

#[tokio::test]
async fn test_repeated_correct_guesses_keep_first_winner() {
    let hub = hub();
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let mut a = admit(&hub, "R1", "pw1", "A").await.unwrap();
    let mut b = admit(&hub, "R1", "pw1", "B").await.unwrap();

    a.say(r#"{"type":"start"}"#);
    a.next().await;
    b.next().await;
    let source = source_of(&hub, "R1").await;
    let guess = format!(r#"{{"type":"guess","data":"{source}"}}"#);

    b.say(&guess);
    assert_eq!(a.next().await, Envelope::new("result", "correct", "B"));
    assert_eq!(b.next().await, Envelope::new("result", "correct", "B"));
    a.say(&guess);
    assert_eq!(a.next().await, Envelope::new("result", "correct", "A"));
    assert_eq!(b.next().await, Envelope::new("result", "correct", "A"));

    let game = hub.room("R1").unwrap().game().await.unwrap();
    assert_eq!(game.current_round().winner().unwrap().as_str(), "B");
}

#[tokio::test]
async fn test_seeded_rooms_draw_the_same_source() {
    let mut sources = Vec::new();
    for _ in 0..2 {
        let hub = hub();
        hub.create_room("R".into(), "pw").await.unwrap();
        let mut a = admit(&hub, "R", "pw", "A").await.unwrap();
        let _b = admit(&hub, "R", "pw", "B").await.unwrap();
        let _c = admit(&hub, "R", "pw", "C").await.unwrap();
        a.say(r#"{"type":"start"}"#);
        a.next().await;
        sources.push(source_of(&hub, "R").await);
    }
    assert_eq!(sources[0], sources[1]);
}

struct OneSongCatalog;

impl Catalog for OneSongCatalog {
    fn reference_track(&self, source: &Player) -> Option<Track> {
        Some(Track {
            id: "t1".into(),
            name: format!("{}'s favourite", source.id),
            artists: vec!["Someone".into()],
        })
    }
}

#[tokio::test]
async fn test_round_carries_catalog_track() {
    let hub: TestHub =
        Arc::new(Hub::with_catalog(config(), Arc::new(OneSongCatalog)).unwrap());
    hub.create_room("R1".into(), "pw1").await.unwrap();
    let mut a = admit(&hub, "R1", "pw1", "A").await.unwrap();

    a.say(r#"{"type":"start"}"#);
    a.next().await;

    let game = hub.room("R1").unwrap().game().await.unwrap();
    let track = game.current_round().track().unwrap();
    assert_eq!(track.id, "t1");
    assert_eq!(track.name, "A's favourite");
}
