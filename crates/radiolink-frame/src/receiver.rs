use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::config::ReceiverConfig;
use crate::error::{FrameError, Result};
use crate::header::{FrameHeader, HEADER_SIZE};
use crate::message::Message;
use crate::options::{Compression, DecodeOptions, MessageClass};
use crate::{rle, xor};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Destination for decoded frames.
pub trait FrameSink {
    /// A text record addressed to this station passed its checksum.
    fn on_text(&mut self, message: Message);

    /// A one-shot audio clip arrived.
    fn on_audio(&mut self, audio: Bytes);

    /// A chunk of streamed audio arrived.
    fn on_audio_stream(&mut self, audio: Bytes);

    /// Bytes received while framing is switched off.
    fn on_raw(&mut self, bytes: Bytes) {
        trace!(len = bytes.len(), "raw delivery ignored");
    }
}

/// One decoded unit, as handed to a [`FrameSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Text(Message),
    Audio(Bytes),
    AudioStream(Bytes),
    Raw(Bytes),
}

impl Delivery {
    /// Hand this delivery to the matching sink method.
    pub fn deliver_to<S: FrameSink + ?Sized>(self, sink: &mut S) {
        match self {
            Delivery::Text(message) => sink.on_text(message),
            Delivery::Audio(audio) => sink.on_audio(audio),
            Delivery::AudioStream(audio) => sink.on_audio_stream(audio),
            Delivery::Raw(bytes) => sink.on_raw(bytes),
        }
    }
}

impl FrameSink for Vec<Delivery> {
    fn on_text(&mut self, message: Message) {
        self.push(Delivery::Text(message));
    }

    fn on_audio(&mut self, audio: Bytes) {
        self.push(Delivery::Audio(audio));
    }

    fn on_audio_stream(&mut self, audio: Bytes) {
        self.push(Delivery::AudioStream(audio));
    }

    fn on_raw(&mut self, bytes: Bytes) {
        self.push(Delivery::Raw(bytes));
    }
}

impl FrameSink for VecDeque<Delivery> {
    fn on_text(&mut self, message: Message) {
        self.push_back(Delivery::Text(message));
    }

    fn on_audio(&mut self, audio: Bytes) {
        self.push_back(Delivery::Audio(audio));
    }

    fn on_audio_stream(&mut self, audio: Bytes) {
        self.push_back(Delivery::AudioStream(audio));
    }

    fn on_raw(&mut self, bytes: Bytes) {
        self.push_back(Delivery::Raw(bytes));
    }
}

/// Where the receiver is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    AwaitingHeader,
    AwaitingPayload,
}

#[derive(Debug, Clone, Copy)]
enum State {
    AwaitingHeader,
    AwaitingPayload {
        header: FrameHeader,
        options: DecodeOptions,
    },
}

/// Counters for everything the receiver accepted or threw away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub frames_dispatched: u64,
    pub invalid_headers: u64,
    pub not_addressed: u64,
    pub checksum_mismatches: u64,
    pub decode_failures: u64,
    /// Bytes dropped by whole-buffer discards.
    pub bytes_discarded: u64,
}

/// Incremental frame reassembler for one link.
///
/// Feed it whatever the link delivers, in whatever chunk sizes; complete
/// frames are decoded and handed to a [`FrameSink`]. Malformed input never
/// surfaces as an error: it is logged, counted and dropped, and the next
/// well-formed header resynchronizes the stream.
///
/// A header that fails validation, or is addressed to another station,
/// discards the whole accumulation buffer. There is no scan for a signature
/// further along.
#[derive(Debug)]
pub struct FrameReceiver {
    buf: BytesMut,
    state: State,
    config: ReceiverConfig,
    stats: ReceiverStats,
}

impl FrameReceiver {
    /// Receiver for `station_id` with default settings.
    pub fn new(station_id: u8) -> Self {
        Self::with_config(ReceiverConfig::for_station(station_id))
    }

    pub fn with_config(config: ReceiverConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            state: State::AwaitingHeader,
            config,
            stats: ReceiverStats::default(),
        }
    }

    /// Accumulate `bytes` and dispatch every frame they complete.
    ///
    /// Never blocks and never fails. Returns the number of frames dispatched
    /// during this call. Bytes past the end of the last complete frame stay
    /// buffered for the next call.
    pub fn on_bytes_available<S: FrameSink + ?Sized>(&mut self, bytes: &[u8], sink: &mut S) -> usize {
        if !self.config.use_header {
            if !bytes.is_empty() {
                sink.on_raw(Bytes::copy_from_slice(bytes));
            }
            return 0;
        }

        self.buf.extend_from_slice(bytes);
        let mut dispatched = 0;

        loop {
            match self.state {
                State::AwaitingHeader => {
                    let Some(header) = FrameHeader::parse(&self.buf) else {
                        break;
                    };
                    match self.accept_header(&header) {
                        Ok(options) => {
                            debug!(
                                class = options.class.name(),
                                data_length = header.data_length,
                                "header accepted, awaiting payload"
                            );
                            self.buf.advance(HEADER_SIZE);
                            self.state = State::AwaitingPayload { header, options };
                        }
                        Err(err) => {
                            self.discard_buffer(err);
                            break;
                        }
                    }
                }
                State::AwaitingPayload { header, options } => {
                    let len = header.data_length as usize;
                    if self.buf.len() < len {
                        trace!(have = self.buf.len(), need = len, "waiting for payload");
                        break;
                    }
                    let payload = self.buf.split_to(len);
                    self.state = State::AwaitingHeader;

                    match self.decode(&header, options, payload) {
                        Ok(delivery) => {
                            delivery.deliver_to(sink);
                            self.stats.frames_dispatched += 1;
                            dispatched += 1;
                        }
                        Err(err) => self.reject(err),
                    }
                }
            }
        }

        dispatched
    }

    /// Drop everything buffered and wait for a fresh header.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = State::AwaitingHeader;
    }

    pub fn state(&self) -> ReceiverState {
        match self.state {
            State::AwaitingHeader => ReceiverState::AwaitingHeader,
            State::AwaitingPayload { .. } => ReceiverState::AwaitingPayload,
        }
    }

    /// Bytes held in the accumulation buffer.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    pub fn set_station_id(&mut self, station_id: u8) {
        self.config.station_id = station_id;
    }

    /// Switch framing on or off. Buffered bytes are dropped either way.
    pub fn set_use_header(&mut self, use_header: bool) {
        self.config.use_header = use_header;
        self.reset();
    }

    fn accept_header(&self, header: &FrameHeader) -> Result<DecodeOptions> {
        let options = header.validate(self.config.max_payload_size)?;
        if options.compression == Compression::Huffman {
            return Err(FrameError::UnsupportedCompression);
        }
        if header.receiver_id != self.config.station_id && !options.class.is_broadcast() {
            return Err(FrameError::NotAddressed {
                receiver: header.receiver_id,
                station: self.config.station_id,
            });
        }
        Ok(options)
    }

    fn decode(
        &self,
        header: &FrameHeader,
        options: DecodeOptions,
        mut payload: BytesMut,
    ) -> Result<Delivery> {
        if options.is_encrypted() {
            xor::apply_in_place(&mut payload, header.encryption_key);
        }

        let escape = match options.class {
            MessageClass::Text => self.config.text_escape,
            MessageClass::Audio | MessageClass::AudioStream => self.config.audio_escape,
        };
        let body = match options.compression {
            Compression::None => payload.freeze(),
            Compression::Rle => {
                let expected = header.uncompressed_length as usize;
                let mut out = Vec::new();
                out.try_reserve_exact(expected)
                    .map_err(|_| FrameError::AllocationFailure { size: expected })?;
                rle::decompress_into(&payload, escape, expected, &mut out)?;
                Bytes::from(out)
            }
            Compression::Huffman => return Err(FrameError::UnsupportedCompression),
        };

        match options.class {
            MessageClass::Text => {
                let message = Message::decode(&body)?;
                message.verify(self.config.checksum_divisor)?;
                debug!(
                    sender_id = message.sender_id,
                    sequence = message.sequence,
                    "text message accepted"
                );
                Ok(Delivery::Text(message))
            }
            MessageClass::Audio => Ok(Delivery::Audio(body)),
            MessageClass::AudioStream => Ok(Delivery::AudioStream(body)),
        }
    }

    fn discard_buffer(&mut self, err: FrameError) {
        let dropped = self.buf.len();
        match &err {
            FrameError::NotAddressed { .. } => {
                self.stats.not_addressed += 1;
                debug!(%err, dropped, "frame not for this station");
            }
            _ => {
                self.stats.invalid_headers += 1;
                warn!(%err, dropped, "discarding receive buffer");
            }
        }
        self.stats.bytes_discarded += dropped as u64;
        self.buf.clear();
    }

    fn reject(&mut self, err: FrameError) {
        match &err {
            FrameError::ChecksumMismatch { .. } => self.stats.checksum_mismatches += 1,
            _ => self.stats.decode_failures += 1,
        }
        warn!(%err, "frame dropped");
    }
}
