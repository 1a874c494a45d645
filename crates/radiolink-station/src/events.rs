use std::sync::mpsc::{self, Receiver, Sender};

use bytes::Bytes;
use tracing::trace;

/// Notifications a station raises toward its collaborators.
///
/// Every method has a no-op default so implementors pick what they need.
pub trait StationEvents {
    /// The message queue now holds `count` messages.
    fn queue_size_changed(&mut self, _count: usize) {}

    /// A one-shot audio broadcast arrived.
    fn audio_received(&mut self, _audio: Bytes) {}

    /// A chunk of streamed audio arrived.
    fn audio_stream_received(&mut self, _audio: Bytes) {}

    /// Bytes arrived while framing is switched off.
    fn raw_received(&mut self, _bytes: Bytes) {}

    /// Playback drained everything it had queued.
    fn playback_stopped(&mut self) {}
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl StationEvents for NoEvents {}

/// An event as carried by [`EventChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationEvent {
    QueueSizeChanged(usize),
    AudioReceived(Bytes),
    AudioStreamReceived(Bytes),
    RawReceived(Bytes),
    PlaybackStopped,
}

/// Forwards events over a channel to another thread.
///
/// Events raised after the receiving end is dropped are discarded.
#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: Sender<StationEvent>,
}

impl EventChannel {
    pub fn new() -> (Self, Receiver<StationEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: StationEvent) {
        if let Err(err) = self.tx.send(event) {
            trace!(event = ?err.0, "event receiver gone");
        }
    }
}

impl StationEvents for EventChannel {
    fn queue_size_changed(&mut self, count: usize) {
        self.emit(StationEvent::QueueSizeChanged(count));
    }

    fn audio_received(&mut self, audio: Bytes) {
        self.emit(StationEvent::AudioReceived(audio));
    }

    fn audio_stream_received(&mut self, audio: Bytes) {
        self.emit(StationEvent::AudioStreamReceived(audio));
    }

    fn raw_received(&mut self, bytes: Bytes) {
        self.emit(StationEvent::RawReceived(bytes));
    }

    fn playback_stopped(&mut self) {
        self.emit(StationEvent::PlaybackStopped);
    }
}

impl StationEvents for Vec<StationEvent> {
    fn queue_size_changed(&mut self, count: usize) {
        self.push(StationEvent::QueueSizeChanged(count));
    }

    fn audio_received(&mut self, audio: Bytes) {
        self.push(StationEvent::AudioReceived(audio));
    }

    fn audio_stream_received(&mut self, audio: Bytes) {
        self.push(StationEvent::AudioStreamReceived(audio));
    }

    fn raw_received(&mut self, bytes: Bytes) {
        self.push(StationEvent::RawReceived(bytes));
    }

    fn playback_stopped(&mut self) {
        self.push(StationEvent::PlaybackStopped);
    }
}
