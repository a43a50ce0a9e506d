//! Message buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForHeader`: Need at least 5 bytes
//! - `WaitingForPayload`: Header parsed, need N more payload bytes
//!
//! Completed frames accumulate in a partial frame stack until a frame
//! without the `MORE` flag closes the multipart message. Partial
//! messages are never exposed to callers.
//!
//! # Example
//!
//! ```ignore
//! use queue_worker::protocol::MessageBuffer;
//!
//! let mut buffer = MessageBuffer::new();
//!
//! // Data arrives in chunks from the socket
//! let messages = buffer.push(&chunk)?;
//! for msg in messages {
//!     println!("got {} frames", msg.len());
//! }
//! ```

use bytes::BytesMut;

use super::message::Message;
use super::wire_format::{
    FrameHeader, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE, MAX_FRAMES_PER_MESSAGE,
};
use crate::error::{Result, WorkerError};

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for a complete header (need 5 bytes).
    WaitingForHeader,
    /// Header parsed, waiting for payload bytes.
    WaitingForPayload { header: FrameHeader },
}

/// Buffer for accumulating incoming bytes and extracting complete
/// multipart messages.
///
/// All raw data is stored in a single `BytesMut`; frame payloads are
/// split off zero-copy. The pending frame stack holds frames of the
/// message currently being assembled.
pub struct MessageBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Frames of the in-progress multipart message.
    pending: Message,
    /// Maximum allowed frame payload size.
    max_frame_size: u32,
}

impl MessageBuffer {
    /// Create a new message buffer with default settings.
    ///
    /// Default capacity: 64KB, max frame size: 1GB.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a new message buffer with a custom max frame size.
    pub fn with_max_frame_size(max_frame_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            state: State::WaitingForHeader,
            pending: Message::new(),
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete messages.
    ///
    /// This is the main API for processing incoming socket data. If data
    /// is fragmented mid-header, mid-payload, or mid-message, the partial
    /// state is kept internally for the next push.
    ///
    /// # Errors
    ///
    /// Returns an error on protocol violations: oversized frame, reserved
    /// flag bits, or a message exceeding the frame-count limit.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Message>> {
        self.feed(data);

        let mut messages = Vec::new();
        while let Some(message) = self.try_extract_one()? {
            messages.push(message);
        }
        Ok(messages)
    }

    /// Buffer raw bytes without extracting anything.
    ///
    /// For callers that consume messages one at a time via
    /// [`try_extract_one`](Self::try_extract_one): nothing is parsed out
    /// until they ask, so no completed message can be lost between a feed
    /// and the next extraction.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to extract a single complete multipart message.
    ///
    /// Returns:
    /// - `Ok(Some(message))` if a message was completed
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` on a protocol violation
    pub fn try_extract_one(&mut self) -> Result<Option<Message>> {
        loop {
            match self.state {
                State::WaitingForHeader => {
                    if self.buffer.len() < FRAME_HEADER_SIZE {
                        return Ok(None);
                    }

                    let header = FrameHeader::decode(&self.buffer[..FRAME_HEADER_SIZE])
                        .expect("buffer has enough bytes");
                    header.validate(self.max_frame_size)?;

                    let _ = self.buffer.split_to(FRAME_HEADER_SIZE);
                    self.state = State::WaitingForPayload { header };
                }

                State::WaitingForPayload { header } => {
                    let needed = header.payload_length as usize;
                    if self.buffer.len() < needed {
                        return Ok(None);
                    }

                    // Extract payload (zero-copy freeze)
                    let payload = self.buffer.split_to(needed).freeze();
                    self.state = State::WaitingForHeader;

                    self.pending.append(payload);
                    if self.pending.len() > MAX_FRAMES_PER_MESSAGE {
                        self.pending = Message::new();
                        return Err(WorkerError::Protocol(format!(
                            "Message exceeds {} frames",
                            MAX_FRAMES_PER_MESSAGE
                        )));
                    }

                    if !header.has_more() {
                        let message = std::mem::take(&mut self.pending);
                        return Ok(Some(message));
                    }
                }
            }
        }
    }

    /// Number of raw buffered bytes not yet parsed into frames.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the raw buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if a multipart message is partially assembled.
    pub fn has_partial_message(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Clear the buffer and reset all parsing state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
        self.pending = Message::new();
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new()
    }
}
