//! Multipart message - an ordered stack of opaque frames.
//!
//! A [`Message`] is the unit of transfer on the wire: one or more byte
//! frames sent back to back, with every frame except the last carrying
//! the `MORE` flag. Frames are opaque at this layer; interpretation
//! happens in the envelope codec.
//!
//! Uses `bytes::Bytes` for zero-copy frame sharing.
//!
//! # Example
//!
//! ```
//! use queue_worker::protocol::Message;
//! use bytes::Bytes;
//!
//! let mut msg = Message::new();
//! msg.append(Bytes::from_static(b"echo"));
//! msg.append(Bytes::from_static(b"hello"));
//!
//! assert_eq!(msg.len(), 2);
//! assert_eq!(&msg.parts()[0][..], b"echo");
//! ```

use bytes::Bytes;

use super::wire_format::{flags, FrameHeader, FRAME_HEADER_SIZE};

/// An ordered sequence of opaque byte frames forming one multipart message.
///
/// Insertion order is wire order. The stack is append-only until sent or
/// replaced wholesale by a receive; frames are never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    frames: Vec<Bytes>,
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Create a message from existing frames.
    pub fn from_frames(frames: Vec<Bytes>) -> Self {
        Self { frames }
    }

    /// Create a single-frame control message (e.g. `READY`, `HEARTBEAT`).
    pub fn signal(token: &str) -> Self {
        Self {
            frames: vec![Bytes::copy_from_slice(token.as_bytes())],
        }
    }

    /// Append a frame to the end of the stack.
    pub fn append(&mut self, frame: Bytes) {
        self.frames.push(frame);
    }

    /// Read-only view of the frames, in wire order.
    pub fn parts(&self) -> &[Bytes] {
        &self.frames
    }

    /// Consume the message and return its frames.
    pub fn into_frames(self) -> Vec<Bytes> {
        self.frames
    }

    /// Number of frames in the stack.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the stack holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total encoded size on the wire (headers + payloads).
    pub fn wire_size(&self) -> usize {
        if self.frames.is_empty() {
            return FRAME_HEADER_SIZE;
        }
        self.frames
            .iter()
            .map(|f| FRAME_HEADER_SIZE + f.len())
            .sum()
    }

    /// Encode the message to its wire representation.
    ///
    /// All frames but the last are marked `MORE`. An empty stack encodes
    /// as a single empty frame, never as zero frames, so receivers always
    /// see at least a minimal one-frame unit.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_size());

        if self.frames.is_empty() {
            buf.extend_from_slice(&FrameHeader::new(0, 0).encode());
            return buf;
        }

        let last = self.frames.len() - 1;
        for (i, frame) in self.frames.iter().enumerate() {
            let frame_flags = if i < last { flags::MORE } else { 0 };
            let header = FrameHeader::new(frame_flags, frame.len() as u32);
            buf.extend_from_slice(&header.encode());
            buf.extend_from_slice(frame);
        }
        buf
    }
}

impl FromIterator<Bytes> for Message {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}
