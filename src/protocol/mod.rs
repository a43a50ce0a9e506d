//! Protocol module - wire format, framing, and multipart messages.
//!
//! This module implements the binary protocol for the broker link:
//! - 5-byte per-frame header encoding/decoding
//! - Message buffer for accumulating partial reads
//! - Multipart message (frame stack) type

mod frame_buffer;
mod message;
mod wire_format;

pub use frame_buffer::MessageBuffer;
pub use message::Message;
pub use wire_format::{
    flags, FrameHeader, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE, MAX_FRAMES_PER_MESSAGE,
};
