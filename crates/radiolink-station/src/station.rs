use std::io::{self, Read, Write};

use bytes::Bytes;
use radiolink_frame::{
    DecodeOptions, FrameEncoder, FrameError, FrameReceiver, FrameSink, FrameWriter, LinkReader,
    Message, ReceiverStats,
};
#[cfg(unix)]
use radiolink_transport::PortConfig;
use radiolink_transport::LinkStream;
use tracing::{debug, info};

use crate::config::StationConfig;
use crate::error::{Result, StationError};
use crate::events::{NoEvents, StationEvents};
use crate::phone_log::PhoneLog;
use crate::queue::MessageQueue;

/// One radio station: a link, a receiver, an encoder and the message store.
///
/// Accepted text messages are queued and logged against their sender; audio
/// is forwarded through [`StationEvents`]. Nothing here spawns threads. Drive
/// reception with [`Station::poll`], or feed bytes from elsewhere with
/// [`Station::on_data_received`].
pub struct Station {
    config: StationConfig,
    reader: LinkReader<Port>,
    writer: FrameWriter<Port>,
    queue: MessageQueue,
    phone_log: PhoneLog,
    events: Box<dyn StationEvents + Send>,
}

impl Station {
    pub fn new(config: StationConfig) -> Self {
        Self::with_events(config, NoEvents)
    }

    pub fn with_events(config: StationConfig, events: impl StationEvents + Send + 'static) -> Self {
        Self {
            reader: LinkReader::new(Port(None), FrameReceiver::with_config(config.receiver_config())),
            writer: FrameWriter::with_encoder(Port(None), FrameEncoder::new(config.encoder_config())),
            config,
            queue: MessageQueue::new(),
            phone_log: PhoneLog::new(),
            events: Box::new(events),
        }
    }

    /// Open the port described by `port` and attach it.
    ///
    /// A link that is already open is closed first.
    #[cfg(unix)]
    pub fn open(&mut self, port: &PortConfig) -> Result<()> {
        let link = radiolink_transport::open(port)?;
        self.attach(link)
    }

    /// Use an already connected link.
    ///
    /// The link is split into a read half and a write half; fails if the
    /// handle cannot be duplicated.
    pub fn attach(&mut self, link: LinkStream) -> Result<()> {
        if self.is_open() {
            self.close();
        }
        let write_half = link.try_clone()?;
        self.reader.get_mut().0 = Some(link);
        self.writer.get_mut().0 = Some(write_half);
        info!(station_id = self.config.station_id, "station link attached");
        Ok(())
    }

    /// Drop the link and any partially received frame.
    pub fn close(&mut self) {
        self.writer.get_mut().0 = None;
        if let Some(link) = self.reader.get_mut().0.take() {
            if let Err(err) = link.shutdown() {
                debug!(%err, "link shutdown failed");
            }
            info!(station_id = self.config.station_id, "station link closed");
        }
        self.reader.receiver_mut().reset();
    }

    pub fn is_open(&self) -> bool {
        self.reader.get_ref().0.is_some()
    }

    /// Encode `payload` and put it on the link.
    ///
    /// With `use_header == false` the payload is written as is. Returns the
    /// number of bytes written.
    pub fn write(
        &mut self,
        payload: &[u8],
        receiver_id: u8,
        use_header: bool,
        options: DecodeOptions,
    ) -> Result<usize> {
        if !self.is_open() {
            return Err(StationError::NotOpen);
        }
        let len = if use_header {
            self.writer.send(payload, receiver_id, options)?
        } else {
            self.writer.send_raw(payload)?
        };
        debug!(receiver_id, len, class = options.class.name(), "frame written");
        Ok(len)
    }

    /// The "data available" handler: push received bytes through the receiver.
    ///
    /// Returns the number of frames dispatched.
    pub fn on_data_received(&mut self, bytes: &[u8]) -> usize {
        let mut dispatch = Dispatch {
            queue: &mut self.queue,
            phone_log: &mut self.phone_log,
            events: self.events.as_mut(),
        };
        self.reader
            .receiver_mut()
            .on_bytes_available(bytes, &mut dispatch)
    }

    /// Block for one read from the link and dispatch what it completes.
    ///
    /// When the far end hangs up the station closes itself and returns
    /// `FrameError::ConnectionClosed`.
    pub fn poll(&mut self) -> Result<usize> {
        if !self.is_open() {
            return Err(StationError::NotOpen);
        }
        let mut dispatch = Dispatch {
            queue: &mut self.queue,
            phone_log: &mut self.phone_log,
            events: self.events.as_mut(),
        };
        match self.reader.poll(&mut dispatch) {
            Err(FrameError::ConnectionClosed) => {
                self.close();
                Err(FrameError::ConnectionClosed.into())
            }
            other => other.map_err(Into::into),
        }
    }

    /// Take the oldest queued message.
    pub fn next_message(&mut self) -> Option<Message> {
        let message = self.queue.pop()?;
        self.events.queue_size_changed(self.queue.len());
        Some(message)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn phone_log(&self) -> &PhoneLog {
        &self.phone_log
    }

    pub fn stats(&self) -> &ReceiverStats {
        self.reader.receiver().stats()
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Switch between framed traffic and raw pass-through.
    pub fn set_use_header(&mut self, use_header: bool) {
        self.config.use_header = use_header;
        self.reader.receiver_mut().set_use_header(use_header);
    }

    /// Change this station's address and sender id.
    pub fn set_station_id(&mut self, station_id: u8) {
        self.config.station_id = station_id;
        self.reader.receiver_mut().set_station_id(station_id);
        self.writer.encoder_mut().set_sender_id(station_id);
    }
}

impl std::fmt::Debug for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Station")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .field("queued", &self.queue.len())
            .field("contacts", &self.phone_log.len())
            .finish()
    }
}

/// One half of the station link; empty while the station is closed.
struct Port(Option<LinkStream>);

impl Read for Port {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.0 {
            Some(link) => link.read(buf),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }
}

impl Write for Port {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.0 {
            Some(link) => link.write(buf),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.0 {
            Some(link) => link.flush(),
            None => Ok(()),
        }
    }
}

struct Dispatch<'a> {
    queue: &'a mut MessageQueue,
    phone_log: &'a mut PhoneLog,
    events: &'a mut (dyn StationEvents + Send),
}

impl FrameSink for Dispatch<'_> {
    fn on_text(&mut self, message: Message) {
        self.phone_log.record(&message);
        let count = self.queue.push(message);
        self.events.queue_size_changed(count);
    }

    fn on_audio(&mut self, audio: Bytes) {
        self.events.audio_received(audio);
    }

    fn on_audio_stream(&mut self, audio: Bytes) {
        self.events.audio_stream_received(audio);
    }

    fn on_raw(&mut self, bytes: Bytes) {
        self.events.raw_received(bytes);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::Receiver;

    use bytes::BytesMut;
    use radiolink_frame::{EncoderConfig, HEADER_SIZE};

    use super::*;
    use crate::events::{EventChannel, StationEvent};

    fn station(id: u8) -> (Station, Receiver<StationEvent>) {
        let (events, rx) = EventChannel::new();
        (
            Station::with_events(StationConfig::for_station(id), events),
            rx,
        )
    }

    fn frame(payload: &[u8], receiver: u8, options: DecodeOptions) -> BytesMut {
        let mut encoder = FrameEncoder::new(EncoderConfig::for_station(1));
        let mut buf = BytesMut::new();
        encoder
            .encode(payload, receiver, options, true, &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn text_is_queued_and_logged() {
        let (mut station, rx) = station(3);
        let wire = frame(b"HELLO", 3, DecodeOptions::text());

        assert_eq!(station.on_data_received(&wire), 1);
        assert_eq!(station.queue_len(), 1);
        assert_eq!(station.phone_log().get(1).unwrap().message_count, 1);
        assert_eq!(rx.try_recv().unwrap(), StationEvent::QueueSizeChanged(1));

        let message = station.next_message().unwrap();
        assert_eq!(message.text(), "HELLO");
        assert_eq!(rx.try_recv().unwrap(), StationEvent::QueueSizeChanged(0));
        assert!(station.next_message().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn audio_goes_to_events_not_queue() {
        let (mut station, rx) = station(3);
        let mut wire = frame(b"clip", 0, DecodeOptions::audio());
        wire.extend_from_slice(&frame(b"chunk", 0, DecodeOptions::audio_stream()));

        assert_eq!(station.on_data_received(&wire), 2);
        assert_eq!(station.queue_len(), 0);
        assert_eq!(
            rx.try_recv().unwrap(),
            StationEvent::AudioReceived(Bytes::from_static(b"clip"))
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StationEvent::AudioStreamReceived(Bytes::from_static(b"chunk"))
        );
    }

    #[test]
    fn raw_mode_passes_bytes_through() {
        let (mut station, rx) = station(3);
        station.set_use_header(false);

        assert_eq!(station.on_data_received(b"+++ATH"), 0);
        assert_eq!(
            rx.try_recv().unwrap(),
            StationEvent::RawReceived(Bytes::from_static(b"+++ATH"))
        );
    }

    #[test]
    fn station_id_change_applies_to_both_directions() {
        let (mut station, _rx) = station(3);
        station.set_station_id(8);

        assert_eq!(station.on_data_received(&frame(b"to 3", 3, DecodeOptions::text())), 0);
        assert_eq!(station.on_data_received(&frame(b"to 8", 8, DecodeOptions::text())), 1);
        assert_eq!(station.stats().not_addressed, 1);
    }

    #[test]
    fn write_requires_open_link() {
        let mut station = Station::new(StationConfig::default());
        let err = station
            .write(b"x", 1, true, DecodeOptions::text())
            .unwrap_err();
        assert!(matches!(err, StationError::NotOpen));
        assert!(matches!(station.poll(), Err(StationError::NotOpen)));
    }

    #[test]
    #[cfg(unix)]
    fn close_drops_partial_frame() {
        let (mut station, _rx) = station(3);
        let (link, _peer) = LinkStream::pair().unwrap();
        station.attach(link).unwrap();

        let wire = frame(b"partial", 3, DecodeOptions::text());
        station.on_data_received(&wire[..HEADER_SIZE + 5]);
        station.close();
        assert!(!station.is_open());

        station.on_data_received(&wire[HEADER_SIZE + 5..]);
        assert_eq!(station.queue_len(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn write_and_poll_share_one_link() {
        let (mut alpha, _alpha_rx) = station(1);
        let (mut bravo, bravo_rx) = station(3);
        let (left, right) = LinkStream::pair().unwrap();
        alpha.attach(left).unwrap();
        bravo.attach(right).unwrap();

        alpha.write(b"ping", 3, true, DecodeOptions::text()).unwrap();
        assert_eq!(bravo.poll().unwrap(), 1);
        assert_eq!(bravo_rx.try_recv().unwrap(), StationEvent::QueueSizeChanged(1));

        bravo.write(b"pong", 1, false, DecodeOptions::text()).unwrap();
        alpha.set_use_header(false);
        assert_eq!(alpha.poll().unwrap(), 0);

        bravo.close();
        assert!(matches!(
            bravo.write(b"late", 1, true, DecodeOptions::text()),
            Err(StationError::NotOpen)
        ));
    }

    #[test]
    #[cfg(unix)]
    fn poll_reports_hangup() {
        let (mut station, _rx) = station(3);
        let (link, peer) = LinkStream::pair().unwrap();
        station.attach(link).unwrap();
        drop(peer);

        let err = station.poll().unwrap_err();
        assert!(matches!(
            err,
            StationError::Frame(FrameError::ConnectionClosed)
        ));
        assert!(!station.is_open());
    }
}
