//! A room's inbox: the many-producer, single-consumer queue between
//! member read loops and the dispatcher.
//!
//! Both buffering policies sit behind the same two types, so the read
//! loop and the dispatcher never branch on policy.

use guessbox_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::InboxPolicy;

/// A raw frame, tagged with the connection that sent it.
#[derive(Debug)]
pub(crate) struct Frame {
    pub conn: ConnectionId,
    pub data: Vec<u8>,
}

/// Why a frame was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum PushError {
    #[error("inbox full")]
    Full,
    #[error("inbox closed")]
    Closed,
}

/// Producer half. Each read loop pushes through a shared reference.
pub(crate) enum InboxTx {
    Unbounded(mpsc::UnboundedSender<Frame>),
    Bounded(mpsc::Sender<Frame>),
}

/// Consumer half, owned by the dispatcher.
pub(crate) enum InboxRx {
    Unbounded(mpsc::UnboundedReceiver<Frame>),
    Bounded(mpsc::Receiver<Frame>),
}

pub(crate) fn channel(policy: InboxPolicy) -> (InboxTx, InboxRx) {
    match policy {
        InboxPolicy::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (InboxTx::Unbounded(tx), InboxRx::Unbounded(rx))
        }
        InboxPolicy::Bounded { capacity } => {
            // mpsc::channel panics on zero.
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (InboxTx::Bounded(tx), InboxRx::Bounded(rx))
        }
    }
}

impl InboxTx {
    /// Queues a frame without waiting.
    pub(crate) fn push(&self, frame: Frame) -> Result<(), PushError> {
        match self {
            Self::Unbounded(tx) => tx.send(frame).map_err(|_| PushError::Closed),
            Self::Bounded(tx) => tx.try_send(frame).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => PushError::Full,
                mpsc::error::TrySendError::Closed(_) => PushError::Closed,
            }),
        }
    }
}

impl InboxRx {
    /// Next frame in enqueue order, or `None` once every producer is gone.
    pub(crate) async fn recv(&mut self) -> Option<Frame> {
        match self {
            Self::Unbounded(rx) => rx.recv().await,
            Self::Bounded(rx) => rx.recv().await,
        }
    }
}
