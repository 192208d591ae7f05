//! In-process transport: a connected pair of channel endpoints.
//!
//! [`pair`] returns the server side ([`MemoryConnection`], which
//! implements [`Connection`]) and the client side ([`MemoryPeer`]), which
//! plays the remote user. Rooms can be exercised end to end without
//! sockets.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, mpsc, watch};

use crate::{Connection, ConnectionId, TransportError};

/// Creates a connected server/client pair.
pub fn pair() -> (MemoryConnection, MemoryPeer) {
    let id = ConnectionId::next();
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (closed_tx, closed_rx) = watch::channel(false);
    let failing = Arc::new(AtomicBool::new(false));

    let conn = MemoryConnection {
        id,
        inbound: Mutex::new(in_rx),
        outbound: out_tx,
        closed: closed_tx,
        failing: Arc::clone(&failing),
    };
    let peer = MemoryPeer {
        id,
        inbound: Some(in_tx),
        outbound: out_rx,
        closed: closed_rx,
        failing,
    };
    (conn, peer)
}

/// Server side of an in-process connection.
pub struct MemoryConnection {
    id: ConnectionId,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    closed: watch::Sender<bool>,
    failing: Arc<AtomicBool>,
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if self.failing.load(Ordering::Acquire) || *self.closed.borrow() {
            return Err(TransportError::WriteFailed {
                conn: self.id,
                reason: "memory connection refused write".into(),
            });
        }
        self.outbound
            .send(data.to_vec())
            .map_err(|_| TransportError::Closed(self.id))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Ok(None);
        }
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            frame = inbound.recv() => Ok(frame),
            _ = closed.wait_for(|c| *c) => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.closed.send_replace(true);
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Client side of an in-process connection.
pub struct MemoryPeer {
    id: ConnectionId,
    inbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    closed: watch::Receiver<bool>,
    failing: Arc<AtomicBool>,
}

impl MemoryPeer {
    /// The id of the server side of this pair.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sends a frame to the server. Returns `false` once the peer has
    /// disconnected or the server side is gone.
    pub fn send(&self, frame: impl Into<Vec<u8>>) -> bool {
        match &self.inbound {
            Some(tx) => tx.send(frame.into()).is_ok(),
            None => false,
        }
    }

    /// Waits for the next frame written by the server.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.outbound.recv().await
    }

    /// Returns the next frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.outbound.try_recv().ok()
    }

    /// Makes every subsequent server-side write fail.
    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::Release);
    }

    /// Returns `true` once the server has closed its side.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Hangs up: the server's next `recv` reports a clean close.
    pub fn disconnect(&mut self) {
        self.inbound = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_delivers_frames_both_ways() {
        let (conn, mut peer) = pair();

        assert!(peer.send(b"ping".to_vec()));
        assert_eq!(conn.recv().await.unwrap(), Some(b"ping".to_vec()));

        conn.send(b"pong").await.unwrap();
        assert_eq!(peer.recv().await, Some(b"pong".to_vec()));
    }

    #[tokio::test]
    async fn test_disconnect_ends_server_recv() {
        let (conn, mut peer) = pair();
        peer.disconnect();

        assert_eq!(conn.recv().await.unwrap(), None);
        assert!(!peer.send(b"late".to_vec()));
    }

    #[tokio::test]
    async fn test_fail_writes_makes_send_fail() {
        let (conn, peer) = pair();
        peer.fail_writes();

        let result = conn.send(b"x").await;
        assert!(matches!(result, Err(TransportError::WriteFailed { .. })));
    }

    #[tokio::test]
    async fn test_close_wakes_pending_recv() {
        let (conn, peer) = pair();
        let conn = Arc::new(conn);

        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::task::yield_now().await;
        conn.close().await.unwrap();

        let result = reader.await.unwrap().unwrap();
        assert_eq!(result, None);
        assert!(peer.is_closed());
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (conn, _peer) = pair();
        conn.close().await.unwrap();

        assert!(conn.send(b"x").await.is_err());
    }
}
