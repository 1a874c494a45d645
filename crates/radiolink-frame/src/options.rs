//! Per-frame decode options.
//!
//! The options byte in the header packs three independent choices:
//!
//! ```text
//!  7   6   5   4     3      2     1   0
//! ┌───────────┬─────┬──────┬─────┬───────┐
//! │ reserved  │ XOR │ HUFF │ RLE │ class │
//! └───────────┴─────┴──────┴─────┴───────┘
//! ```
//!
//! The message class is a two-bit value, not a flag: Text is `0`, so it can
//! never be tested for with a bit mask.

use crate::error::{FrameError, Result};

const CLASS_MASK: u8 = 0b0000_0011;
const RLE_BIT: u8 = 0b0000_0100;
const HUFFMAN_BIT: u8 = 0b0000_1000;
const XOR_BIT: u8 = 0b0001_0000;
const RESERVED_MASK: u8 = 0b1110_0000;

/// What a frame carries, which also decides how it is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageClass {
    /// A station-addressed text message record.
    #[default]
    Text = 0,
    /// A one-shot audio clip, delivered to every station.
    Audio = 1,
    /// A chunk of continuous audio, delivered to every station.
    AudioStream = 2,
}

impl MessageClass {
    /// Broadcast classes are delivered regardless of the receiver id.
    pub fn is_broadcast(self) -> bool {
        matches!(self, MessageClass::Audio | MessageClass::AudioStream)
    }

    /// Human-readable class name.
    pub fn name(self) -> &'static str {
        match self {
            MessageClass::Text => "TEXT",
            MessageClass::Audio => "AUDIO",
            MessageClass::AudioStream => "AUDIO_STREAM",
        }
    }
}

/// Payload compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    #[default]
    None,
    /// Escape-byte run-length encoding.
    Rle,
    /// Reserved. Frames asking for it are refused on both paths.
    Huffman,
}

/// Payload obfuscation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encryption {
    #[default]
    None,
    /// XOR with the key carried in the header.
    Xor,
}

/// Message class, compression and encryption of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecodeOptions {
    pub class: MessageClass,
    pub compression: Compression,
    pub encryption: Encryption,
}

impl DecodeOptions {
    /// Plain options for `class`: no compression, no encryption.
    pub fn new(class: MessageClass) -> Self {
        Self {
            class,
            compression: Compression::None,
            encryption: Encryption::None,
        }
    }

    pub fn text() -> Self {
        Self::new(MessageClass::Text)
    }

    pub fn audio() -> Self {
        Self::new(MessageClass::Audio)
    }

    pub fn audio_stream() -> Self {
        Self::new(MessageClass::AudioStream)
    }

    /// Request run-length compression.
    pub fn with_rle(mut self) -> Self {
        self.compression = Compression::Rle;
        self
    }

    /// Request XOR obfuscation.
    pub fn with_xor(mut self) -> Self {
        self.encryption = Encryption::Xor;
        self
    }

    pub fn is_compressed(&self) -> bool {
        self.compression != Compression::None
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption == Encryption::Xor
    }

    /// Pack into the header byte.
    pub fn to_byte(self) -> u8 {
        let compression = match self.compression {
            Compression::None => 0,
            Compression::Rle => RLE_BIT,
            Compression::Huffman => HUFFMAN_BIT,
        };
        let encryption = match self.encryption {
            Encryption::None => 0,
            Encryption::Xor => XOR_BIT,
        };
        self.class as u8 | compression | encryption
    }

    /// Unpack a header byte.
    ///
    /// Rejects the unused class value `3`, reserved bits, and a byte that
    /// asks for both compression schemes at once.
    pub fn from_byte(byte: u8) -> Result<Self> {
        let invalid = || FrameError::InvalidDecodeOptions(byte);
        if byte & RESERVED_MASK != 0 {
            return Err(invalid());
        }
        let class = match byte & CLASS_MASK {
            0 => MessageClass::Text,
            1 => MessageClass::Audio,
            2 => MessageClass::AudioStream,
            _ => return Err(invalid()),
        };
        let compression = match (byte & RLE_BIT != 0, byte & HUFFMAN_BIT != 0) {
            (false, false) => Compression::None,
            (true, false) => Compression::Rle,
            (false, true) => Compression::Huffman,
            (true, true) => return Err(invalid()),
        };
        let encryption = if byte & XOR_BIT != 0 {
            Encryption::Xor
        } else {
            Encryption::None
        };
        Ok(Self {
            class,
            compression,
            encryption,
        })
    }
}
