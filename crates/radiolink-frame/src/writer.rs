use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use radiolink_transport::LinkStream;

use crate::config::FrameConfig;
use crate::encoder::FrameEncoder;
use crate::error::{FrameError, Result};
use crate::options::DecodeOptions;
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    encoder: FrameEncoder,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with a default encoder.
    pub fn new(inner: T) -> Self {
        Self::with_encoder(inner, FrameEncoder::default())
    }

    pub fn with_encoder(inner: T, encoder: FrameEncoder) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            encoder,
        }
    }

    /// Encode `payload` for `receiver_id` and write the whole frame (blocking).
    ///
    /// Returns the number of bytes put on the link.
    pub fn send(&mut self, payload: &[u8], receiver_id: u8, options: DecodeOptions) -> Result<usize> {
        self.buf.clear();
        let len = self
            .encoder
            .encode(payload, receiver_id, options, true, &mut self.buf)?;
        self.write_buffered()?;
        Ok(len)
    }

    /// Write `payload` with no header or transformation.
    pub fn send_raw(&mut self, payload: &[u8]) -> Result<usize> {
        self.buf.clear();
        let len = self
            .encoder
            .encode(payload, 0, DecodeOptions::default(), false, &mut self.buf)?;
        self.write_buffered()?;
        Ok(len)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    pub fn encoder(&self) -> &FrameEncoder {
        &self.encoder
    }

    pub fn encoder_mut(&mut self) -> &mut FrameEncoder {
        &mut self.encoder
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// `WouldBlock` and `TimedOut` are returned as errors: on a link with a
    /// write timeout they mean the far end stopped reading.
    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        self.flush()
    }
}

impl FrameWriter<LinkStream> {
    /// Create a frame writer for a `LinkStream` and apply the write timeout from config.
    pub fn with_config_link(
        inner: LinkStream,
        encoder: FrameEncoder,
        config: &FrameConfig,
    ) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_encoder(inner, encoder))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::config::EncoderConfig;
    use crate::header::{FrameHeader, HEADER_SIZE};
    use crate::message::MESSAGE_SIZE;
    use crate::receiver::{Delivery, FrameReceiver};

    fn decode_all(wire: &[u8], station: u8) -> Vec<Delivery> {
        let mut receiver = FrameReceiver::new(station);
        let mut out = Vec::new();
        receiver.on_bytes_available(wire, &mut out);
        out
    }

    #[test]
    fn write_text_frame() {
        let mut writer = FrameWriter::with_encoder(
            Cursor::new(Vec::<u8>::new()),
            FrameEncoder::new(EncoderConfig::for_station(1)),
        );

        let written = writer.send(b"hello", 3, DecodeOptions::text()).unwrap();
        assert_eq!(written, HEADER_SIZE + MESSAGE_SIZE);

        let wire = writer.into_inner().into_inner();
        let deliveries = decode_all(&wire, 3);
        assert_eq!(deliveries.len(), 1);
        match &deliveries[0] {
            Delivery::Text(message) => {
                assert_eq!(message.text(), "hello");
                assert_eq!(message.sender_id, 1);
            }
            other => panic!("unexpected delivery: {other:?}"),
        }
    }

    #[test]
    fn write_multiple_frames() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send(b"one", 2, DecodeOptions::text().with_rle()).unwrap();
        writer.send(b"two", 0, DecodeOptions::audio().with_xor()).unwrap();
        writer
            .send(b"three", 0, DecodeOptions::audio_stream().with_rle().with_xor())
            .unwrap();

        let wire = writer.into_inner().into_inner();
        let deliveries = decode_all(&wire, 2);
        assert_eq!(deliveries.len(), 3);
        assert_eq!(deliveries[1], Delivery::Audio(Bytes::from_static(b"two")));
        assert_eq!(
            deliveries[2],
            Delivery::AudioStream(Bytes::from_static(b"three"))
        );
    }

    #[test]
    fn raw_send_writes_payload_only() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        assert_eq!(writer.send_raw(b"AT+RESET\r\n").unwrap(), 10);
        assert_eq!(writer.into_inner().into_inner(), b"AT+RESET\r\n");
    }

    #[test]
    fn encode_failure_writes_nothing() {
        let mut writer = FrameWriter::with_encoder(
            Cursor::new(Vec::<u8>::new()),
            FrameEncoder::new(EncoderConfig {
                max_payload_size: 4,
                ..EncoderConfig::default()
            }),
        );

        let err = writer
            .send(b"oversized", 0, DecodeOptions::audio())
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn header_key_comes_from_encoder() {
        let mut writer = FrameWriter::with_encoder(
            Cursor::new(Vec::<u8>::new()),
            FrameEncoder::new(EncoderConfig {
                encryption_key: 0x33,
                ..EncoderConfig::default()
            }),
        );
        writer.send(b"k", 0, DecodeOptions::audio().with_xor()).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(FrameHeader::parse(&wire).unwrap().encryption_key, 0x33);
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(b"x", 0, DecodeOptions::audio()).unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = FrameWriter::new(writer_impl);
        writer.send(b"retry", 0, DecodeOptions::audio()).unwrap();

        let inner = writer.into_inner();
        assert_eq!(decode_all(&inner.data, 0).len(), 1);
    }

    #[test]
    fn stalled_link_surfaces_as_error() {
        let mut writer = FrameWriter::new(Stalled { attempts: 0 });
        let err = writer.send(b"stuck", 0, DecodeOptions::audio()).unwrap_err();

        match err {
            FrameError::Io(io) => assert_eq!(io.kind(), ErrorKind::WouldBlock),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(writer.get_ref().attempts, 1);
    }

    #[test]
    #[cfg(unix)]
    fn write_timeout_ends_send_when_peer_stops_reading() {
        let (stream, _peer) = LinkStream::pair().unwrap();
        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(20)),
            ..FrameConfig::default()
        };
        let mut writer =
            FrameWriter::with_config_link(stream, FrameEncoder::default(), &cfg).unwrap();

        let clip = vec![0x11u8; 256 * 1024];
        let err = loop {
            if let Err(err) = writer.send(&clip, 0, DecodeOptions::audio()) {
                break err;
            }
        };
        match err {
            FrameError::Io(io) => assert!(matches!(
                io.kind(),
                ErrorKind::WouldBlock | ErrorKind::TimedOut
            )),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(b"x", 0, DecodeOptions::audio()).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    #[cfg(unix)]
    fn applies_write_timeout_for_link_stream() {
        let (stream, _peer) = LinkStream::pair().unwrap();
        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };

        let writer = FrameWriter::with_config_link(stream, FrameEncoder::default(), &cfg);
        assert!(writer.is_ok());
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct Stalled {
        attempts: usize,
    }

    impl Write for Stalled {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.attempts += 1;
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
