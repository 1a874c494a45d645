//! `tokio_util::codec` adapter around [`FrameReceiver`] and [`FrameEncoder`].
//!
//! Use with `FramedRead` / `FramedWrite` (or `Framed`) over any async byte
//! stream. Decoding never fails on malformed input; it behaves exactly like
//! the synchronous receiver and only yields frames that decoded cleanly.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::config::{EncoderConfig, ReceiverConfig};
use crate::encoder::FrameEncoder;
use crate::error::FrameError;
use crate::options::DecodeOptions;
use crate::receiver::{Delivery, FrameReceiver};

/// A frame to be sent through [`LinkCodec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub payload: Bytes,
    pub receiver_id: u8,
    pub options: DecodeOptions,
}

impl Outbound {
    pub fn new(payload: impl Into<Bytes>, receiver_id: u8, options: DecodeOptions) -> Self {
        Self {
            payload: payload.into(),
            receiver_id,
            options,
        }
    }

    pub fn text(payload: impl Into<Bytes>, receiver_id: u8) -> Self {
        Self::new(payload, receiver_id, DecodeOptions::text())
    }

    pub fn audio(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, 0, DecodeOptions::audio())
    }

    pub fn audio_stream(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, 0, DecodeOptions::audio_stream())
    }
}

/// Async codec for station-addressed frames.
#[derive(Debug)]
pub struct LinkCodec {
    receiver: FrameReceiver,
    encoder: FrameEncoder,
    pending: VecDeque<Delivery>,
}

impl LinkCodec {
    /// Codec for `station_id`, using it both as receive address and sender id.
    pub fn new(station_id: u8) -> Self {
        Self::with_config(
            ReceiverConfig::for_station(station_id),
            EncoderConfig::for_station(station_id),
        )
    }

    pub fn with_config(receiver: ReceiverConfig, encoder: EncoderConfig) -> Self {
        Self {
            receiver: FrameReceiver::with_config(receiver),
            encoder: FrameEncoder::new(encoder),
            pending: VecDeque::new(),
        }
    }

    pub fn receiver(&self) -> &FrameReceiver {
        &self.receiver
    }

    pub fn encoder(&self) -> &FrameEncoder {
        &self.encoder
    }
}

impl Decoder for LinkCodec {
    type Item = Delivery;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            // The receiver keeps its own partial-frame state; hand it everything.
            let chunk = src.split();
            self.receiver.on_bytes_available(&chunk, &mut self.pending);
        }
        Ok(self.pending.pop_front())
    }
}

impl Encoder<Outbound> for LinkCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Outbound, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let use_header = self.receiver.config().use_header;
        self.encoder
            .encode(&item.payload, item.receiver_id, item.options, use_header, dst)?;
        Ok(())
    }
}
