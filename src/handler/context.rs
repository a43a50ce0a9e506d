//! Reply capability for handlers.
//!
//! Handlers never touch the primary connection or the loop's internals.
//! They get a [`Replier`]: the origin of the request they are serving
//! plus the single capability of queueing an outgoing message on the
//! relay. The event loop forwards queued messages onto the broker
//! connection verbatim on a following cycle.

use bytes::Bytes;

use crate::envelope::build_reply;
use crate::protocol::Message;
use crate::relay::RelaySender;

/// Capability object passed to command handlers.
///
/// `Replier` is `Clone` and safe to move into spawned tasks, so a
/// handler may offload long work and reply asynchronously.
#[derive(Clone)]
pub struct Replier {
    /// Routing identity of the requester.
    origin: Bytes,
    /// Command this reply belongs to.
    command: String,
    /// Relay into the event loop.
    relay: RelaySender,
}

impl Replier {
    /// Create a replier bound to a request.
    pub fn new(origin: Bytes, command: impl Into<String>, relay: RelaySender) -> Self {
        Self {
            origin,
            command: command.into(),
            relay,
        }
    }

    /// Routing identity of the requester.
    pub fn origin(&self) -> &Bytes {
        &self.origin
    }

    /// Queue an arbitrary outgoing message, forwarded verbatim.
    ///
    /// Fire-and-forget: never blocks, never reports failure.
    pub fn send(&self, message: Message) {
        self.relay.queue_send(message);
    }

    /// Queue a reply routed back to the requester:
    /// `[origin] [command] [arg…]`.
    pub fn reply(&self, args: impl IntoIterator<Item = Bytes>) {
        let message = build_reply(self.origin.clone(), &self.command, args);
        self.relay.queue_send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::relay_channel;

    #[tokio::test]
    async fn test_send_forwards_verbatim() {
        let (tx, mut rx) = relay_channel(8);
        let replier = Replier::new(Bytes::from_static(b"client-1"), "echo", tx);

        let mut msg = Message::new();
        msg.append(Bytes::from_static(b"hello"));
        replier.send(msg.clone());

        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.parts(), msg.parts());
    }

    #[tokio::test]
    async fn test_reply_routes_to_origin() {
        let (tx, mut rx) = relay_channel(8);
        let replier = Replier::new(Bytes::from_static(b"client-1"), "echo", tx);

        replier.reply(vec![Bytes::from_static(b"hello")]);

        let queued = rx.recv().await.unwrap();
        assert_eq!(&queued.parts()[0][..], b"client-1");
        assert_eq!(&queued.parts()[1][..], b"echo");
        assert_eq!(&queued.parts()[2][..], b"hello");
    }

    #[tokio::test]
    async fn test_replier_usable_from_spawned_task() {
        let (tx, mut rx) = relay_channel(8);
        let replier = Replier::new(Bytes::from_static(b"client-1"), "slow", tx);

        tokio::spawn(async move {
            replier.reply(vec![Bytes::from_static(b"done")]);
        })
        .await
        .unwrap();

        assert!(rx.recv().await.is_some());
    }

    #[test]
    fn test_origin_accessor() {
        let (tx, _rx) = relay_channel(1);
        let replier = Replier::new(Bytes::from_static(b"abc"), "cmd", tx);
        assert_eq!(&replier.origin()[..], b"abc");
    }
}
