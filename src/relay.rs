//! Outbound queue relay - cross-thread handoff to the event loop.
//!
//! Handlers (and any other task or thread) hand outgoing messages to the
//! event loop through a bounded mpsc channel instead of touching the
//! primary connection, which only the loop owns.
//!
//! ```text
//! Handler 1 ─┐
//! Handler 2 ─┼─► RelaySender::queue_send ─► Event Loop ─► Broker socket
//! Handler N ─┘
//! ```
//!
//! Delivery is fire-and-forget: `queue_send` never blocks the caller and
//! never reports failure back. A full or closed channel drops the
//! message with a warning - the surrounding protocol tolerates the
//! occasional lost reply. Per-sender FIFO holds; there is no global
//! order across concurrent senders.

use tokio::sync::mpsc;
use tracing::warn;

use crate::protocol::Message;

/// Default relay channel capacity.
pub const DEFAULT_RELAY_CAPACITY: usize = 1024;

/// Create a relay channel pair.
///
/// The sender side is cheaply cloneable and goes to handlers; the
/// receiver side is polled by the event loop.
pub fn relay_channel(capacity: usize) -> (RelaySender, RelayReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (RelaySender { tx }, RelayReceiver { rx })
}

/// Sending half of the relay, usable from any task or thread.
#[derive(Clone)]
pub struct RelaySender {
    tx: mpsc::Sender<Message>,
}

impl RelaySender {
    /// Queue an outgoing message for the event loop to forward.
    ///
    /// Never blocks and never fails from the caller's point of view.
    pub fn queue_send(&self, message: Message) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("relay queue full, dropping outgoing message");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("relay closed, dropping outgoing message");
            }
        }
    }
}

/// Receiving half of the relay, owned by the event loop.
pub struct RelayReceiver {
    rx: mpsc::Receiver<Message>,
}

impl RelayReceiver {
    /// Receive the next relayed message.
    ///
    /// Returns `None` once every sender has been dropped.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Non-blocking receive, for draining in tests.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn one_frame(s: &str) -> Message {
        Message::signal(s)
    }

    #[tokio::test]
    async fn test_queue_send_delivers() {
        let (tx, mut rx) = relay_channel(8);

        tx.queue_send(one_frame("HEARTBEAT"));

        let msg = rx.recv().await.unwrap();
        assert_eq!(&msg.parts()[0][..], b"HEARTBEAT");
    }

    #[tokio::test]
    async fn test_per_sender_fifo() {
        let (tx, mut rx) = relay_channel(8);

        for i in 0..5u8 {
            let mut msg = Message::new();
            msg.append(Bytes::copy_from_slice(&[i]));
            tx.queue_send(msg);
        }

        for i in 0..5u8 {
            let msg = rx.recv().await.unwrap();
            assert_eq!(msg.parts()[0][0], i);
        }
    }

    #[tokio::test]
    async fn test_full_channel_drops_silently() {
        let (tx, mut rx) = relay_channel(2);

        tx.queue_send(one_frame("a"));
        tx.queue_send(one_frame("b"));
        // Capacity reached - this one is dropped, caller unaffected.
        tx.queue_send(one_frame("c"));

        assert!(rx.try_recv().is_some());
        assert!(rx.try_recv().is_some());
        assert!(rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (tx, rx) = relay_channel(2);
        drop(rx);

        // Must not panic or block.
        tx.queue_send(one_frame("orphan"));
    }

    #[tokio::test]
    async fn test_recv_none_after_senders_dropped() {
        let (tx, mut rx) = relay_channel(2);
        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_clone_senders_share_channel() {
        let (tx, mut rx) = relay_channel(8);
        let tx2 = tx.clone();

        tx.queue_send(one_frame("from-a"));
        tx2.queue_send(one_frame("from-b"));

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
    }
}
