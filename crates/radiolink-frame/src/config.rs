use std::time::Duration;

use crate::{checksum, rle, xor};

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Link-level I/O settings for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// Settings for the receiving side of a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Frames of the text class are accepted only when addressed to this id.
    pub station_id: u8,
    pub checksum_divisor: u8,
    /// Headers declaring a larger payload are discarded.
    pub max_payload_size: usize,
    /// When false, deliveries are passed through unparsed.
    pub use_header: bool,
    pub text_escape: u8,
    pub audio_escape: u8,
}

impl ReceiverConfig {
    pub fn for_station(station_id: u8) -> Self {
        Self {
            station_id,
            ..Self::default()
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            station_id: 0,
            checksum_divisor: checksum::DEFAULT_DIVISOR,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            use_header: true,
            text_escape: rle::TEXT_ESCAPE,
            audio_escape: rle::AUDIO_ESCAPE,
        }
    }
}

/// Settings for the sending side of a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Written into the sender field of outgoing text records.
    pub sender_id: u8,
    pub priority: u8,
    pub encryption_key: u8,
    pub checksum_divisor: u8,
    pub max_payload_size: usize,
    pub text_escape: u8,
    pub audio_escape: u8,
}

impl EncoderConfig {
    pub fn for_station(sender_id: u8) -> Self {
        Self {
            sender_id,
            ..Self::default()
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            sender_id: 0,
            priority: 1,
            encryption_key: xor::DEFAULT_KEY,
            checksum_divisor: checksum::DEFAULT_DIVISOR,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            text_escape: rle::TEXT_ESCAPE,
            audio_escape: rle::AUDIO_ESCAPE,
        }
    }
}
