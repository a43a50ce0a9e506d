//! Envelope codec - request/reply format on top of the frame stack.
//!
//! Wire shapes:
//! - Signal: exactly one frame whose bytes equal a control token
//!   (`READY`, `HEARTBEAT`).
//! - Request: `[origin] [command] [arg0] [arg1] ...` - origin is the
//!   routing frame added by the broker, command is UTF-8, args are
//!   opaque frames.
//!
//! Anything else is malformed and gets dropped by the event loop with a
//! warning; classification never fails hard.

use bytes::Bytes;

use crate::protocol::Message;

/// Control token sent once after (re)connecting.
pub const READY: &str = "READY";

/// Control token sent periodically in both directions.
pub const HEARTBEAT: &str = "HEARTBEAT";

/// Tokens recognized as single-frame signals.
const CONTROL_TOKENS: &[&str] = &[READY, HEARTBEAT];

/// A parsed command request.
#[derive(Debug, Clone)]
pub struct Request {
    /// Identity of the sender, taken from the routing frame.
    pub origin: Bytes,
    /// Command name.
    pub command: String,
    /// Remaining argument frames, in wire order.
    pub args: Vec<Bytes>,
}

impl Request {
    /// Origin rendered for log lines (lossy for non-UTF-8 identities).
    pub fn origin_str(&self) -> String {
        String::from_utf8_lossy(&self.origin).into_owned()
    }
}

/// Classification of a received message.
#[derive(Debug)]
pub enum Incoming {
    /// Single-frame control message with a recognized token.
    Signal(String),
    /// Command request with routing envelope.
    Request(Request),
    /// Wrong shape for either kind; the reason is for the log line.
    Malformed(&'static str),
}

/// Classify a received message as a signal, a request, or malformed.
///
/// A message is a signal iff it consists of exactly one frame whose
/// content is a recognized control token. A request needs at least an
/// origin frame and a UTF-8 command frame.
pub fn classify(message: &Message) -> Incoming {
    let parts = message.parts();

    if parts.len() == 1 {
        if let Ok(token) = std::str::from_utf8(&parts[0]) {
            if CONTROL_TOKENS.contains(&token) {
                return Incoming::Signal(token.to_string());
            }
        }
        return Incoming::Malformed("single frame is not a known control token");
    }

    if parts.len() < 2 {
        return Incoming::Malformed("request needs origin and command frames");
    }

    let command = match std::str::from_utf8(&parts[1]) {
        Ok(s) => s.to_string(),
        Err(_) => return Incoming::Malformed("command frame is not UTF-8"),
    };

    Incoming::Request(Request {
        origin: parts[0].clone(),
        command,
        args: parts[2..].to_vec(),
    })
}

/// Build an outgoing request message: `[command] [arg…]`.
pub fn build_request(command: &str, args: impl IntoIterator<Item = Bytes>) -> Message {
    let mut msg = Message::new();
    msg.append(Bytes::copy_from_slice(command.as_bytes()));
    for arg in args {
        msg.append(arg);
    }
    msg
}

/// Build an outgoing reply routed back to `dest`: `[dest] [command] [arg…]`.
pub fn build_reply(dest: Bytes, command: &str, args: impl IntoIterator<Item = Bytes>) -> Message {
    let mut msg = Message::new();
    msg.append(dest);
    msg.append(Bytes::copy_from_slice(command.as_bytes()));
    for arg in args {
        msg.append(arg);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(frames: &[&[u8]]) -> Message {
        frames.iter().map(|f| Bytes::copy_from_slice(f)).collect()
    }

    #[test]
    fn test_heartbeat_classified_as_signal() {
        match classify(&msg(&[b"HEARTBEAT"])) {
            Incoming::Signal(token) => assert_eq!(token, HEARTBEAT),
            other => panic!("expected signal, got {:?}", other),
        }
    }

    #[test]
    fn test_ready_classified_as_signal() {
        assert!(matches!(
            classify(&msg(&[b"READY"])),
            Incoming::Signal(t) if t == READY
        ));
    }

    #[test]
    fn test_unknown_single_frame_is_malformed() {
        assert!(matches!(
            classify(&msg(&[b"NOT_A_TOKEN"])),
            Incoming::Malformed(_)
        ));
    }

    #[test]
    fn test_empty_single_frame_is_malformed() {
        // The minimal one-empty-frame unit is a valid message but not a
        // recognized signal.
        assert!(matches!(classify(&msg(&[b""])), Incoming::Malformed(_)));
    }

    #[test]
    fn test_zero_frame_message_is_malformed() {
        // classify accepts any Message, including a zero-frame stack
        // built directly; it must classify as malformed rather than
        // index past the frame list.
        assert!(matches!(classify(&Message::new()), Incoming::Malformed(_)));
    }

    #[test]
    fn test_multi_frame_never_a_signal() {
        // Even a token in the first slot is a request once >= 2 frames.
        match classify(&msg(&[b"HEARTBEAT", b"HEARTBEAT"])) {
            Incoming::Request(req) => assert_eq!(req.command, "HEARTBEAT"),
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_request_parsing() {
        match classify(&msg(&[b"client-7", b"echo", b"hello", b"world"])) {
            Incoming::Request(req) => {
                assert_eq!(&req.origin[..], b"client-7");
                assert_eq!(req.command, "echo");
                assert_eq!(req.args.len(), 2);
                assert_eq!(&req.args[0][..], b"hello");
                assert_eq!(&req.args[1][..], b"world");
            }
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_request_with_no_args() {
        match classify(&msg(&[b"client", b"status"])) {
            Incoming::Request(req) => {
                assert_eq!(req.command, "status");
                assert!(req.args.is_empty());
            }
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_non_utf8_command_is_malformed() {
        assert!(matches!(
            classify(&msg(&[b"client", &[0xFF, 0xFE]])),
            Incoming::Malformed(_)
        ));
    }

    #[test]
    fn test_build_request_shape() {
        let req = build_request("fetch", vec![Bytes::from_static(b"block")]);
        assert_eq!(req.len(), 2);
        assert_eq!(&req.parts()[0][..], b"fetch");
        assert_eq!(&req.parts()[1][..], b"block");
    }

    #[test]
    fn test_build_reply_prefixes_routing_frame() {
        let reply = build_reply(
            Bytes::from_static(b"client-7"),
            "echo",
            vec![Bytes::from_static(b"hello")],
        );
        assert_eq!(reply.len(), 3);
        assert_eq!(&reply.parts()[0][..], b"client-7");
        assert_eq!(&reply.parts()[1][..], b"echo");
        assert_eq!(&reply.parts()[2][..], b"hello");
    }

    #[test]
    fn test_origin_str_lossy() {
        let req = Request {
            origin: Bytes::from_static(&[0xFF]),
            command: "x".into(),
            args: vec![],
        };
        // Must not panic on binary identities.
        assert!(!req.origin_str().is_empty());
    }
}
