use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};

use crate::checksum;
use crate::error::{FrameError, Result};

/// Capacity of the text field of a message record.
pub const TEXT_CAPACITY: usize = 128;

/// Size of a message record on the wire.
pub const MESSAGE_SIZE: usize = 1 + 1 + 1 + 2 + 4 + TEXT_CAPACITY + 1;

const CHECKSUM_OFFSET: usize = MESSAGE_SIZE - 1;

/// A text message record.
///
/// Wire format (integers little-endian):
/// ```text
/// receiver (1) | sender (1) | priority (1) | sequence (2) | timestamp (4) | text (128) | checksum (1)
/// ```
/// The checksum covers every byte before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub receiver_id: u8,
    pub sender_id: u8,
    pub priority: u8,
    pub sequence: u16,
    /// Seconds since the Unix epoch, UTC.
    pub timestamp: u32,
    text: [u8; TEXT_CAPACITY],
    pub checksum: u8,
}

impl Message {
    /// Build a record with `text` truncated or zero-padded to [`TEXT_CAPACITY`].
    ///
    /// The checksum is left at zero; call [`Message::seal`] before sending.
    pub fn new(receiver_id: u8, sender_id: u8, text: &[u8]) -> Self {
        let mut buf = [0u8; TEXT_CAPACITY];
        let len = text.len().min(TEXT_CAPACITY);
        buf[..len].copy_from_slice(&text[..len]);
        Self {
            receiver_id,
            sender_id,
            priority: 0,
            sequence: 0,
            timestamp: now_utc_seconds(),
            text: buf,
            checksum: 0,
        }
    }

    /// The raw, zero-padded text field.
    pub fn text_bytes(&self) -> &[u8; TEXT_CAPACITY] {
        &self.text
    }

    /// The text up to the first NUL, decoded lossily as UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        let end = self
            .text
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(TEXT_CAPACITY);
        String::from_utf8_lossy(&self.text[..end])
    }

    /// Compute and store the checksum.
    pub fn seal(&mut self, divisor: u8) {
        self.checksum = self.compute_checksum(divisor);
    }

    /// Checksum over every field except the checksum itself.
    pub fn compute_checksum(&self, divisor: u8) -> u8 {
        let mut buf = BytesMut::with_capacity(MESSAGE_SIZE);
        self.encode(&mut buf);
        checksum::compute(&buf[..CHECKSUM_OFFSET], divisor)
    }

    /// Whether the stored checksum matches the record contents.
    pub fn has_valid_checksum(&self, divisor: u8) -> bool {
        self.checksum == self.compute_checksum(divisor)
    }

    /// Fail with [`FrameError::ChecksumMismatch`] unless the checksum matches.
    pub fn verify(&self, divisor: u8) -> Result<()> {
        let actual = self.compute_checksum(divisor);
        if actual == self.checksum {
            Ok(())
        } else {
            Err(FrameError::ChecksumMismatch {
                expected: self.checksum,
                actual,
            })
        }
    }

    /// Append the record to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(MESSAGE_SIZE);
        dst.put_u8(self.receiver_id);
        dst.put_u8(self.sender_id);
        dst.put_u8(self.priority);
        dst.put_u16_le(self.sequence);
        dst.put_u32_le(self.timestamp);
        dst.put_slice(&self.text);
        dst.put_u8(self.checksum);
    }

    /// Decode a record. `src` must be exactly [`MESSAGE_SIZE`] bytes.
    ///
    /// The checksum is read, not verified.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() != MESSAGE_SIZE {
            return Err(FrameError::MalformedMessage {
                len: src.len(),
                expected: MESSAGE_SIZE,
            });
        }
        let mut buf = src;
        let receiver_id = buf.get_u8();
        let sender_id = buf.get_u8();
        let priority = buf.get_u8();
        let sequence = buf.get_u16_le();
        let timestamp = buf.get_u32_le();
        let mut text = [0u8; TEXT_CAPACITY];
        buf.copy_to_slice(&mut text);
        let checksum = buf.get_u8();
        Ok(Self {
            receiver_id,
            sender_id,
            priority,
            sequence,
            timestamp,
            text,
            checksum,
        })
    }
}

fn now_utc_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
