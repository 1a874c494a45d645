use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::options::DecodeOptions;

/// Header size on the wire.
pub const HEADER_SIZE: usize = 20;

/// Frame signature, carried twice.
pub const SIGNATURE: u32 = 0xDEAD_BEEF;

/// Header format version.
pub const VERSION: u8 = 1;

/// Fixed-size header sent in front of every payload.
///
/// Wire format (all integers little-endian):
/// ```text
/// ┌───────────┬────────────┬──────────┬──────────────┬─────┬─────┬──────┬─────┐
/// │ Signature │ Signature2 │ Data len │ Uncompressed │ Rcv │ Ver │ Opts │ Key │
/// │ (4B)      │ (4B)       │ (4B)     │ len (4B)     │ 1B  │ 1B  │ 1B   │ 1B  │
/// └───────────┴────────────┴──────────┴──────────────┴─────┴─────┴──────┴─────┘
/// ```
/// `data_length` bytes of payload follow immediately; there is no delimiter
/// between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub signature: u32,
    pub signature2: u32,
    /// Payload bytes on the wire, after compression and XOR.
    pub data_length: u32,
    /// Payload bytes once decompressed.
    pub uncompressed_length: u32,
    pub receiver_id: u8,
    pub version: u8,
    pub decode_opts: u8,
    pub encryption_key: u8,
}

impl FrameHeader {
    /// A signed, current-version header with zero lengths.
    pub fn new(receiver_id: u8, options: DecodeOptions, encryption_key: u8) -> Self {
        Self {
            signature: SIGNATURE,
            signature2: SIGNATURE,
            data_length: 0,
            uncompressed_length: 0,
            receiver_id,
            version: VERSION,
            decode_opts: options.to_byte(),
            encryption_key,
        }
    }

    /// Append the header to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_u32_le(self.signature);
        dst.put_u32_le(self.signature2);
        dst.put_u32_le(self.data_length);
        dst.put_u32_le(self.uncompressed_length);
        dst.put_u8(self.receiver_id);
        dst.put_u8(self.version);
        dst.put_u8(self.decode_opts);
        dst.put_u8(self.encryption_key);
    }

    /// Read a header from the front of `src` without validating it.
    ///
    /// Returns `None` if fewer than [`HEADER_SIZE`] bytes are available.
    pub fn parse(src: &[u8]) -> Option<Self> {
        let mut buf = src.get(..HEADER_SIZE)?;
        Some(Self {
            signature: buf.get_u32_le(),
            signature2: buf.get_u32_le(),
            data_length: buf.get_u32_le(),
            uncompressed_length: buf.get_u32_le(),
            receiver_id: buf.get_u8(),
            version: buf.get_u8(),
            decode_opts: buf.get_u8(),
            encryption_key: buf.get_u8(),
        })
    }

    /// Both signatures equal the protocol constant.
    pub fn has_valid_signature(&self) -> bool {
        self.signature == SIGNATURE && self.signature == self.signature2
    }

    /// Decode the options byte.
    pub fn options(&self) -> Result<DecodeOptions> {
        DecodeOptions::from_byte(self.decode_opts)
    }

    /// Check everything about the header that does not depend on who we are.
    ///
    /// Both declared lengths are bounded by `max_payload` so the receiver
    /// never waits for, or allocates, more than it is configured to.
    pub fn validate(&self, max_payload: usize) -> Result<DecodeOptions> {
        if !self.has_valid_signature() {
            return Err(FrameError::InvalidSignature {
                signature: self.signature,
                signature2: self.signature2,
            });
        }
        if self.version != VERSION {
            return Err(FrameError::UnsupportedVersion(self.version));
        }
        let options = self.options()?;
        let largest = self.data_length.max(self.uncompressed_length) as usize;
        if largest > max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: largest,
                max: max_payload,
            });
        }
        Ok(options)
    }

    /// Total wire size of the frame this header announces.
    pub fn frame_size(&self) -> usize {
        HEADER_SIZE + self.data_length as usize
    }
}
