//! Audio staging between the link and a PCM device.
//!
//! The station only moves bytes; it has no opinion on sample format. A
//! [`PcmSink`] plays whatever it is handed and a [`PcmSource`] fills a
//! buffer from a microphone. Streamed audio is staged in a shared
//! [`StreamingBuffer`] so the link side and the device side can run on
//! different threads.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use radiolink_frame::StreamingBuffer;
use tracing::{debug, trace};

use crate::events::StationEvents;

/// Default number of bytes moved per pump or capture step.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Output device.
pub trait PcmSink {
    /// Play `pcm` in full.
    fn play(&mut self, pcm: &[u8]) -> io::Result<()>;
}

/// Input device.
pub trait PcmSource {
    /// Fill `buf` with captured audio and return how much was written.
    fn record(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl PcmSink for Vec<u8> {
    fn play(&mut self, pcm: &[u8]) -> io::Result<()> {
        self.extend_from_slice(pcm);
        Ok(())
    }
}

/// What [`AudioPlayback`] is currently feeding the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Broadcast,
    Streaming,
}

/// Plays one-shot broadcasts and streamed audio through a [`PcmSink`].
///
/// Broadcasts that arrive while something is playing wait their turn.
/// Streamed chunks are appended to the staging buffer and drained after any
/// pending broadcasts. Call [`AudioPlayback::pump`] from the playback loop.
#[derive(Debug)]
pub struct AudioPlayback<S> {
    sink: S,
    state: PlaybackState,
    current: Option<Bytes>,
    pending: VecDeque<Bytes>,
    stream: Arc<StreamingBuffer>,
    chunk_size: usize,
}

impl<S: PcmSink> AudioPlayback<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: PlaybackState::Idle,
            current: None,
            pending: VecDeque::new(),
            stream: Arc::new(StreamingBuffer::new()),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Queue a one-shot broadcast.
    pub fn on_audio(&mut self, audio: Bytes) {
        if audio.is_empty() {
            return;
        }
        if self.state == PlaybackState::Idle {
            debug!(len = audio.len(), "broadcast playback started");
            self.current = Some(audio);
            self.state = PlaybackState::Broadcast;
        } else {
            debug!(len = audio.len(), waiting = self.pending.len() + 1, "broadcast pending");
            self.pending.push_back(audio);
        }
    }

    /// Stage a chunk of streamed audio.
    pub fn on_audio_stream(&mut self, audio: &[u8]) {
        self.stream.append(audio);
        if self.state == PlaybackState::Idle && !audio.is_empty() {
            self.state = PlaybackState::Streaming;
        }
    }

    /// Feed up to one chunk to the sink.
    ///
    /// Returns the number of bytes played. When everything queued has been
    /// played the state returns to idle and `playback_stopped` is raised once.
    pub fn pump<E: StationEvents + ?Sized>(&mut self, events: &mut E) -> io::Result<usize> {
        if self.state == PlaybackState::Idle {
            // Stream audio may be appended straight into the shared buffer.
            if self.stream.available() == 0 {
                return Ok(0);
            }
            self.state = PlaybackState::Streaming;
        }
        match self.state {
            PlaybackState::Idle => Ok(0),
            PlaybackState::Broadcast => {
                let Some(clip) = self.current.take() else {
                    self.advance(events);
                    return Ok(0);
                };
                let len = self.chunk_size.min(clip.len());
                if let Err(err) = self.sink.play(&clip[..len]) {
                    self.current = Some(clip);
                    return Err(err);
                }
                let rest = clip.slice(len..);
                if rest.is_empty() {
                    self.advance(events);
                } else {
                    self.current = Some(rest);
                }
                Ok(len)
            }
            PlaybackState::Streaming => {
                let piece = self.stream.read(self.chunk_size);
                self.stream.compact();
                if piece.is_empty() {
                    self.advance(events);
                    return Ok(0);
                }
                trace!(len = piece.len(), "stream chunk played");
                self.sink.play(&piece)?;
                Ok(piece.len())
            }
        }
    }

    /// Drop everything queued or staged without raising `playback_stopped`.
    pub fn stop(&mut self) {
        self.current = None;
        self.pending.clear();
        self.stream.clear();
        self.state = PlaybackState::Idle;
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state != PlaybackState::Idle
    }

    /// Broadcasts waiting behind the current one.
    pub fn pending_broadcasts(&self) -> usize {
        self.pending.len()
    }

    /// The staging buffer, for feeding stream audio from another thread.
    pub fn stream_buffer(&self) -> Arc<StreamingBuffer> {
        Arc::clone(&self.stream)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn advance<E: StationEvents + ?Sized>(&mut self, events: &mut E) {
        if let Some(next) = self.pending.pop_front() {
            self.current = Some(next);
            self.state = PlaybackState::Broadcast;
        } else if self.stream.available() > 0 {
            self.state = PlaybackState::Streaming;
        } else {
            self.state = PlaybackState::Idle;
            debug!("playback stopped");
            events.playback_stopped();
        }
    }
}

/// Records from a [`PcmSource`] and hands out chunks ready to send.
#[derive(Debug)]
pub struct AudioCapture<S> {
    source: S,
    recording: bool,
    buffer: Arc<StreamingBuffer>,
    chunk_size: usize,
}

impl<S: PcmSource> AudioCapture<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            recording: false,
            buffer: Arc::new(StreamingBuffer::new()),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Start recording into an empty buffer.
    pub fn start(&mut self) {
        self.buffer.clear();
        self.recording = true;
        debug!("recording started");
    }

    pub fn stop(&mut self) {
        self.recording = false;
        debug!(buffered = self.buffer.available(), "recording stopped");
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Pull one chunk from the source. Does nothing unless recording.
    pub fn capture(&mut self) -> io::Result<usize> {
        if !self.recording {
            return Ok(0);
        }
        let mut chunk = vec![0u8; self.chunk_size];
        let n = self.source.record(&mut chunk)?;
        self.buffer.append(&chunk[..n]);
        Ok(n)
    }

    /// The next chunk for an audio stream frame.
    ///
    /// While recording only full chunks are handed out; once stopped the
    /// remainder comes out as a final short chunk.
    pub fn next_chunk(&mut self) -> Option<Bytes> {
        let available = self.buffer.available();
        if available == 0 || (self.recording && available < self.chunk_size) {
            return None;
        }
        let chunk = self.buffer.read(self.chunk_size);
        self.buffer.compact();
        Some(chunk)
    }

    /// Everything recorded and not yet handed out, for a one-shot broadcast.
    pub fn take_recording(&mut self) -> Bytes {
        let all = self.buffer.read(usize::MAX);
        self.buffer.clear();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StationEvent;

    fn drain<S: PcmSink>(playback: &mut AudioPlayback<S>, events: &mut Vec<StationEvent>) {
        for _ in 0..1000 {
            if !playback.is_playing() {
                return;
            }
            playback.pump(events).unwrap();
        }
        panic!("playback never stopped");
    }

    #[test]
    fn broadcast_plays_in_chunks() {
        let mut playback = AudioPlayback::new(Vec::new()).with_chunk_size(4);
        let mut events = Vec::new();
        playback.on_audio(Bytes::from_static(b"0123456789"));

        assert_eq!(playback.pump(&mut events).unwrap(), 4);
        assert_eq!(playback.pump(&mut events).unwrap(), 4);
        assert_eq!(playback.pump(&mut events).unwrap(), 2);
        assert_eq!(playback.sink().as_slice(), b"0123456789");
        assert_eq!(events, vec![StationEvent::PlaybackStopped]);
        assert_eq!(playback.state(), PlaybackState::Idle);
    }

    #[test]
    fn broadcast_waits_while_playing() {
        let mut playback = AudioPlayback::new(Vec::new()).with_chunk_size(3);
        let mut events = Vec::new();
        playback.on_audio(Bytes::from_static(b"aaa"));
        playback.on_audio(Bytes::from_static(b"bbb"));
        assert_eq!(playback.pending_broadcasts(), 1);

        drain(&mut playback, &mut events);
        assert_eq!(playback.sink().as_slice(), b"aaabbb");
        assert_eq!(events, vec![StationEvent::PlaybackStopped]);
    }

    #[test]
    fn stream_drains_through_staging_buffer() {
        let mut playback = AudioPlayback::new(Vec::new()).with_chunk_size(5);
        let mut events = Vec::new();
        playback.on_audio_stream(b"stream-");
        playback.on_audio_stream(b"audio");
        assert_eq!(playback.state(), PlaybackState::Streaming);

        drain(&mut playback, &mut events);
        assert_eq!(playback.sink().as_slice(), b"stream-audio");
        assert_eq!(events, vec![StationEvent::PlaybackStopped]);
        assert!(playback.stream_buffer().is_empty());
    }

    #[test]
    fn stream_resumes_after_broadcast() {
        let mut playback = AudioPlayback::new(Vec::new()).with_chunk_size(8);
        let mut events = Vec::new();
        playback.on_audio(Bytes::from_static(b"clip"));
        playback.on_audio_stream(b"live");

        drain(&mut playback, &mut events);
        assert_eq!(playback.sink().as_slice(), b"cliplive");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn stop_is_silent() {
        let mut playback = AudioPlayback::new(Vec::new());
        let mut events = Vec::new();
        playback.on_audio(Bytes::from_static(b"x"));
        playback.on_audio_stream(b"y");
        playback.stop();

        assert_eq!(playback.pump(&mut events).unwrap(), 0);
        assert!(events.is_empty());
        assert!(playback.sink().is_empty());
    }

    #[test]
    fn stream_appended_from_another_thread_is_played() {
        let mut playback = AudioPlayback::new(Vec::new()).with_chunk_size(4);
        let mut events = Vec::new();
        let shared = playback.stream_buffer();
        std::thread::spawn(move || {
            shared.append(b"pcm-from-thread");
        })
        .join()
        .unwrap();

        assert_eq!(playback.state(), PlaybackState::Idle);
        assert_eq!(playback.pump(&mut events).unwrap(), 4);
        assert_eq!(playback.state(), PlaybackState::Streaming);

        drain(&mut playback, &mut events);
        assert_eq!(playback.sink().as_slice(), b"pcm-from-thread");
        assert_eq!(events, vec![StationEvent::PlaybackStopped]);
    }

    struct FlakySink {
        played: Vec<u8>,
        fail_next: bool,
    }

    impl PcmSink for FlakySink {
        fn play(&mut self, pcm: &[u8]) -> io::Result<()> {
            if std::mem::take(&mut self.fail_next) {
                return Err(io::Error::other("device busy"));
            }
            self.played.extend_from_slice(pcm);
            Ok(())
        }
    }

    #[test]
    fn failed_play_keeps_the_clip() {
        let sink = FlakySink {
            played: Vec::new(),
            fail_next: true,
        };
        let mut playback = AudioPlayback::new(sink).with_chunk_size(4);
        let mut events = Vec::new();
        playback.on_audio(Bytes::from_static(b"0123456789"));

        assert!(playback.pump(&mut events).is_err());
        assert_eq!(playback.state(), PlaybackState::Broadcast);

        drain(&mut playback, &mut events);
        assert_eq!(playback.sink().played.as_slice(), b"0123456789");
        assert_eq!(events, vec![StationEvent::PlaybackStopped]);
    }

    struct Tone(u8);

    impl PcmSource for Tone {
        fn record(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            buf.fill(self.0);
            Ok(buf.len())
        }
    }

    #[test]
    fn capture_hands_out_full_chunks_while_recording() {
        let mut capture = AudioCapture::new(Tone(7)).with_chunk_size(4);
        assert_eq!(capture.capture().unwrap(), 0);

        capture.start();
        capture.capture().unwrap();
        assert_eq!(capture.next_chunk().unwrap().as_ref(), &[7u8; 4]);
        assert!(capture.next_chunk().is_none());
    }

    #[test]
    fn capture_flushes_remainder_after_stop() {
        struct Short;
        impl PcmSource for Short {
            fn record(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                buf[..3].copy_from_slice(b"abc");
                Ok(3)
            }
        }

        let mut capture = AudioCapture::new(Short).with_chunk_size(8);
        capture.start();
        capture.capture().unwrap();
        assert!(capture.next_chunk().is_none());

        capture.stop();
        assert_eq!(capture.next_chunk().unwrap().as_ref(), b"abc");
        assert!(capture.next_chunk().is_none());
    }

    #[test]
    fn take_recording_returns_everything() {
        let mut capture = AudioCapture::new(Tone(1)).with_chunk_size(2);
        capture.start();
        capture.capture().unwrap();
        capture.capture().unwrap();
        capture.stop();

        assert_eq!(capture.take_recording().as_ref(), &[1u8; 4]);
        assert!(capture.next_chunk().is_none());
    }
}
