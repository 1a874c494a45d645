use std::path::Path;

use radiolink_frame::{checksum, rle, xor, EncoderConfig, ReceiverConfig, DEFAULT_MAX_PAYLOAD};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Everything a station needs to know about itself and the link protocol.
///
/// Loaded from JSON; every field is optional and falls back to its default.
///
/// ```json
/// { "station_id": 3, "encryption_key": 81, "use_header": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    /// This station's address, also written as sender id on outgoing text.
    pub station_id: u8,
    /// Priority stamped on outgoing text records.
    pub priority: u8,
    pub checksum_divisor: u8,
    /// XOR key placed in the header of outgoing frames.
    pub encryption_key: u8,
    pub text_escape: u8,
    pub audio_escape: u8,
    pub max_payload_size: usize,
    /// Frame traffic when true, raw pass-through when false.
    pub use_header: bool,
}

impl StationConfig {
    pub fn for_station(station_id: u8) -> Self {
        Self {
            station_id,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig {
            station_id: self.station_id,
            checksum_divisor: self.checksum_divisor,
            max_payload_size: self.max_payload_size,
            use_header: self.use_header,
            text_escape: self.text_escape,
            audio_escape: self.audio_escape,
        }
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            sender_id: self.station_id,
            priority: self.priority,
            encryption_key: self.encryption_key,
            checksum_divisor: self.checksum_divisor,
            max_payload_size: self.max_payload_size,
            text_escape: self.text_escape,
            audio_escape: self.audio_escape,
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            station_id: 0,
            priority: 1,
            checksum_divisor: checksum::DEFAULT_DIVISOR,
            encryption_key: xor::DEFAULT_KEY,
            text_escape: rle::TEXT_ESCAPE,
            audio_escape: rle::AUDIO_ESCAPE,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            use_header: true,
        }
    }
}
