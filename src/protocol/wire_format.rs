//! Wire format encoding and decoding.
//!
//! Each frame of a multipart message is prefixed with a 5-byte header:
//! ```text
//! ┌───────┬──────────┐
//! │ Flags │ Length   │
//! │ 1 byte│ 4 bytes  │
//! │       │ uint32 BE│
//! └───────┴──────────┘
//! ```
//!
//! The `MORE` flag marks every frame except the last one of a message,
//! so a receiver knows when a multipart unit is complete.

use crate::error::{Result, WorkerError};

/// Frame header size in bytes (fixed, exactly 5).
pub const FRAME_HEADER_SIZE: usize = 5;

/// Default maximum frame payload size (1 GB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 1_073_741_824;

/// Maximum number of frames in a single multipart message.
pub const MAX_FRAMES_PER_MESSAGE: usize = 256;

/// Flag constants for the frame header.
pub mod flags {
    /// Another frame follows in the same multipart message.
    pub const MORE: u8 = 0b0000_0001;

    /// Reserved bits mask (bits 1-7).
    pub const RESERVED_MASK: u8 = 0b1111_1110;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Flags byte (see `flags` module).
    pub flags: u8,
    /// Payload length in bytes.
    pub payload_length: u32,
}

impl FrameHeader {
    /// Create a new frame header.
    pub fn new(flags: u8, payload_length: u32) -> Self {
        Self {
            flags,
            payload_length,
        }
    }

    /// Encode the header to bytes (Big Endian length).
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        buf[0] = self.flags;
        buf[1..5].copy_from_slice(&self.payload_length.to_be_bytes());
        buf
    }

    /// Decode a header from bytes.
    ///
    /// Returns `None` if the buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < FRAME_HEADER_SIZE {
            return None;
        }
        Some(Self {
            flags: buf[0],
            payload_length: u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]),
        })
    }

    /// Validate the header for protocol compliance.
    ///
    /// Checks that the payload does not exceed the size limit and that
    /// reserved flag bits are zero.
    pub fn validate(&self, max_frame_size: u32) -> Result<()> {
        if self.payload_length > max_frame_size {
            return Err(WorkerError::Protocol(format!(
                "Frame size {} exceeds maximum {}",
                self.payload_length, max_frame_size
            )));
        }

        if self.flags & flags::RESERVED_MASK != 0 {
            return Err(WorkerError::Protocol(
                "Reserved flag bits must be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if another frame follows in the same message.
    #[inline]
    pub fn has_more(&self) -> bool {
        flags::has_flag(self.flags, flags::MORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_encode_decode_roundtrip() {
        let original = FrameHeader::new(flags::MORE, 100);
        let encoded = original.encode();
        let decoded = FrameHeader::decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_header_big_endian_byte_order() {
        let header = FrameHeader::new(0x01, 0x0203_0405);
        let bytes = header.encode();

        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[1], 0x02);
        assert_eq!(bytes[2], 0x03);
        assert_eq!(bytes[3], 0x04);
        assert_eq!(bytes[4], 0x05);
    }

    #[test]
    fn test_header_size_is_exactly_5() {
        assert_eq!(FRAME_HEADER_SIZE, 5);
        let header = FrameHeader::new(0, 0);
        assert_eq!(header.encode().len(), 5);
    }

    #[test]
    fn test_decode_too_short_buffer() {
        let buf = [0u8; 4]; // One byte short
        assert!(FrameHeader::decode(&buf).is_none());
    }

    #[test]
    fn test_validate_payload_too_large() {
        let header = FrameHeader::new(0, 1_000_000);
        let result = header.validate(100); // Max 100 bytes
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_validate_reserved_bits_must_be_zero() {
        let header = FrameHeader::new(0b1000_0000, 0); // Bit 7 set
        let result = header.validate(DEFAULT_MAX_FRAME_SIZE);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Reserved flag bits"));
    }

    #[test]
    fn test_has_more() {
        assert!(FrameHeader::new(flags::MORE, 0).has_more());
        assert!(!FrameHeader::new(0, 0).has_more());
    }

    #[test]
    fn test_flags_has_flag() {
        assert!(flags::has_flag(flags::MORE, flags::MORE));
        assert!(!flags::has_flag(0, flags::MORE));
    }
}
