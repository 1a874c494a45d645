use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::config::EncoderConfig;
use crate::error::{FrameError, Result};
use crate::header::{FrameHeader, HEADER_SIZE};
use crate::message::{Message, MESSAGE_SIZE};
use crate::options::{Compression, DecodeOptions, MessageClass};
use crate::{rle, xor};

/// Builds outbound frames.
///
/// Text payloads are wrapped in a checksummed [`Message`] record; audio
/// payloads go out as they are. Either may then be run-length compressed and
/// XOR obscured according to the requested [`DecodeOptions`].
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    config: EncoderConfig,
    sequence: u16,
}

impl FrameEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            sequence: 0,
        }
    }

    /// Encode one frame and append it to `dst`.
    ///
    /// With `use_header == false` the payload is appended unmodified, for
    /// peers that speak the bare legacy stream. Returns the number of bytes
    /// appended.
    pub fn encode(
        &mut self,
        payload: &[u8],
        receiver_id: u8,
        options: DecodeOptions,
        use_header: bool,
        dst: &mut BytesMut,
    ) -> Result<usize> {
        if !use_header {
            self.check_size(payload.len())?;
            dst.put_slice(payload);
            return Ok(payload.len());
        }
        if options.compression == Compression::Huffman {
            return Err(FrameError::UnsupportedCompression);
        }

        let (mut body, escape) = match options.class {
            MessageClass::Text => {
                let message = self.build_message(payload, receiver_id);
                debug!(
                    receiver_id,
                    sequence = message.sequence,
                    checksum = message.checksum,
                    "encoding text record"
                );
                let mut record = BytesMut::with_capacity(MESSAGE_SIZE);
                message.encode(&mut record);
                (record.to_vec(), self.config.text_escape)
            }
            MessageClass::Audio | MessageClass::AudioStream => {
                self.check_size(payload.len())?;
                (payload.to_vec(), self.config.audio_escape)
            }
        };

        let uncompressed_length = body.len();
        if options.compression == Compression::Rle {
            body = rle::compress(&body, escape);
            debug!(
                uncompressed = uncompressed_length,
                compressed = body.len(),
                "run-length encoded payload"
            );
        }
        self.check_size(body.len())?;

        let mut header = FrameHeader::new(receiver_id, options, self.config.encryption_key);
        header.data_length = body.len() as u32;
        header.uncompressed_length = uncompressed_length as u32;

        if options.is_encrypted() {
            xor::apply_in_place(&mut body, header.encryption_key);
        }

        dst.reserve(HEADER_SIZE + body.len());
        header.encode(dst);
        dst.put_slice(&body);
        if options.class == MessageClass::Text {
            self.sequence = self.sequence.wrapping_add(1);
        }

        debug!(
            class = options.class.name(),
            receiver_id,
            data_length = header.data_length,
            "frame encoded"
        );
        Ok(HEADER_SIZE + body.len())
    }

    /// Sequence number the next text record will carry.
    pub fn next_sequence(&self) -> u16 {
        self.sequence
    }

    /// Current encoder configuration.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Change the sender id written into text records.
    pub fn set_sender_id(&mut self, sender_id: u8) {
        self.config.sender_id = sender_id;
    }

    fn build_message(&mut self, text: &[u8], receiver_id: u8) -> Message {
        let mut message = Message::new(receiver_id, self.config.sender_id, text);
        message.priority = self.config.priority;
        message.sequence = self.sequence;
        message.seal(self.config.checksum_divisor);
        message
    }

    fn check_size(&self, size: usize) -> Result<()> {
        let max = self.config.max_payload_size.min(u32::MAX as usize);
        if size > max {
            return Err(FrameError::PayloadTooLarge { size, max });
        }
        Ok(())
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::DEFAULT_DIVISOR;
    use crate::header::SIGNATURE;

    fn encode(
        encoder: &mut FrameEncoder,
        payload: &[u8],
        receiver: u8,
        opts: DecodeOptions,
    ) -> BytesMut {
        let mut buf = BytesMut::new();
        let written = encoder.encode(payload, receiver, opts, true, &mut buf).unwrap();
        assert_eq!(written, buf.len());
        buf
    }

    #[test]
    fn plain_text_frame_layout() {
        let mut encoder = FrameEncoder::new(EncoderConfig::for_station(2));
        let buf = encode(&mut encoder, b"HELLO", 3, DecodeOptions::text());

        let header = FrameHeader::parse(&buf).unwrap();
        assert_eq!(header.signature, SIGNATURE);
        assert_eq!(header.signature2, SIGNATURE);
        assert_eq!(header.receiver_id, 3);
        assert_eq!(header.data_length as usize, MESSAGE_SIZE);
        assert_eq!(header.uncompressed_length as usize, MESSAGE_SIZE);
        assert_eq!(buf.len(), HEADER_SIZE + MESSAGE_SIZE);

        let message = Message::decode(&buf[HEADER_SIZE..]).unwrap();
        assert_eq!(message.text(), "HELLO");
        assert_eq!(message.receiver_id, 3);
        assert_eq!(message.sender_id, 2);
        assert_eq!(message.priority, 1);
        assert!(message.has_valid_checksum(DEFAULT_DIVISOR));
    }

    #[test]
    fn rle_shrinks_padded_text_record() {
        let mut encoder = FrameEncoder::default();
        let buf = encode(&mut encoder, b"HI", 1, DecodeOptions::text().with_rle());

        let header = FrameHeader::parse(&buf).unwrap();
        assert_eq!(header.uncompressed_length as usize, MESSAGE_SIZE);
        assert!((header.data_length as usize) < MESSAGE_SIZE);

        let record = rle::decompress(
            &buf[HEADER_SIZE..],
            rle::TEXT_ESCAPE,
            header.uncompressed_length as usize,
        )
        .unwrap();
        assert_eq!(Message::decode(&record).unwrap().text(), "HI");
    }

    #[test]
    fn xor_obscures_payload_with_header_key() {
        let mut encoder = FrameEncoder::new(EncoderConfig {
            encryption_key: 0x5A,
            ..EncoderConfig::default()
        });
        let audio = vec![1u8, 2, 3, 4, 5];
        let buf = encode(&mut encoder, &audio, 0, DecodeOptions::audio().with_xor());

        let header = FrameHeader::parse(&buf).unwrap();
        assert_eq!(header.encryption_key, 0x5A);
        assert_eq!(&buf[HEADER_SIZE..], xor::apply(&audio, 0x5A).as_slice());
    }

    #[test]
    fn audio_rle_uses_audio_escape() {
        let mut encoder = FrameEncoder::default();
        let audio = vec![0x80u8; 64];
        let buf = encode(&mut encoder, &audio, 0, DecodeOptions::audio_stream().with_rle());

        assert_eq!(&buf[HEADER_SIZE..], &[rle::AUDIO_ESCAPE, 64, 0x80]);
        let header = FrameHeader::parse(&buf).unwrap();
        assert_eq!(header.uncompressed_length, 64);
        assert_eq!(header.data_length, 3);
    }

    #[test]
    fn raw_mode_writes_payload_only() {
        let mut encoder = FrameEncoder::default();
        let mut buf = BytesMut::new();
        let written = encoder
            .encode(b"raw bytes", 9, DecodeOptions::text(), false, &mut buf)
            .unwrap();
        assert_eq!(written, 9);
        assert_eq!(buf.as_ref(), b"raw bytes");
    }

    #[test]
    fn sequence_advances_per_text_record() {
        let mut encoder = FrameEncoder::default();
        let first = encode(&mut encoder, b"a", 1, DecodeOptions::text());
        let second = encode(&mut encoder, b"b", 1, DecodeOptions::text());
        encode(&mut encoder, b"audio", 1, DecodeOptions::audio());

        let seq = |buf: &BytesMut| Message::decode(&buf[HEADER_SIZE..]).unwrap().sequence;
        assert_eq!(seq(&first), 0);
        assert_eq!(seq(&second), 1);
        assert_eq!(encoder.next_sequence(), 2);
    }

    #[test]
    fn refused_text_keeps_its_sequence_number() {
        let mut encoder = FrameEncoder::new(EncoderConfig {
            max_payload_size: 64,
            ..EncoderConfig::default()
        });
        let mut buf = BytesMut::new();
        let err = encoder
            .encode(b"too big once wrapped", 1, DecodeOptions::text(), true, &mut buf)
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: MESSAGE_SIZE, max: 64 }));
        assert!(buf.is_empty());
        assert_eq!(encoder.next_sequence(), 0);

        // Compressed, the padded record fits.
        let buf = encode(&mut encoder, b"", 1, DecodeOptions::text().with_rle());
        assert!(buf.len() > HEADER_SIZE);
        assert_eq!(encoder.next_sequence(), 1);
    }

    #[test]
    fn huffman_is_refused() {
        let mut encoder = FrameEncoder::default();
        let opts = DecodeOptions {
            compression: Compression::Huffman,
            ..DecodeOptions::audio()
        };
        let mut buf = BytesMut::new();
        let err = encoder.encode(b"x", 0, opts, true, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedCompression));
        assert!(buf.is_empty());
    }

    #[test]
    fn oversized_audio_is_refused() {
        let mut encoder = FrameEncoder::new(EncoderConfig {
            max_payload_size: 8,
            ..EncoderConfig::default()
        });
        let mut buf = BytesMut::new();
        let err = encoder
            .encode(&[0u8; 9], 0, DecodeOptions::audio(), true, &mut buf)
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 9, max: 8 }));
    }

    #[test]
    fn expansion_past_limit_is_refused() {
        // Every escape byte costs three bytes once encoded.
        let mut encoder = FrameEncoder::new(EncoderConfig {
            max_payload_size: 10,
            ..EncoderConfig::default()
        });
        let audio = [0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00];
        let mut buf = BytesMut::new();
        let err = encoder
            .encode(&audio, 0, DecodeOptions::audio().with_rle(), true, &mut buf)
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }
}
