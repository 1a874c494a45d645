//! Dual-cursor byte buffer shared between a producer and a consumer.
//!
//! Audio arriving off the link is appended on the receive side while a
//! playback driver pulls from the same buffer on its own thread (and the
//! other way round for capture-to-send). Each side has its own cursor:
//!
//! ```text
//! 0            read                write == len
//! ├─ consumed ──┼──── available ─────┤
//! ```
//!
//! Every operation takes the lock once and works on the guarded state
//! directly, so compaction never re-enters the lock.

use std::io::{Read, Write};
use std::sync::{Mutex, MutexGuard};

use bytes::{Buf, Bytes, BytesMut};

#[derive(Debug, Default)]
struct Inner {
    data: BytesMut,
    read_pos: usize,
}

impl Inner {
    fn append(&mut self, bytes: &[u8]) -> usize {
        self.data.extend_from_slice(bytes);
        bytes.len()
    }

    fn read(&mut self, max_len: usize) -> Bytes {
        let end = self.read_pos.saturating_add(max_len).min(self.data.len());
        let chunk = Bytes::copy_from_slice(&self.data[self.read_pos..end]);
        self.read_pos = end;
        chunk
    }

    fn remove_chunk(&mut self, offset: usize) {
        let offset = offset.min(self.data.len());
        self.data.advance(offset);
        self.read_pos = self.read_pos.saturating_sub(offset);
        if self.data.is_empty() {
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.data.clear();
        self.read_pos = 0;
    }
}

/// A mutex-guarded byte buffer with independent append and read cursors.
///
/// Share it between threads with `Arc<StreamingBuffer>`; `&StreamingBuffer`
/// implements [`Read`] and [`Write`] for drivers that want plain I/O traits.
#[derive(Debug, Default)]
pub struct StreamingBuffer {
    inner: Mutex<Inner>,
}

impl StreamingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                data: BytesMut::with_capacity(capacity),
                read_pos: 0,
            }),
        }
    }

    /// Append `bytes` at the tail, wherever the read cursor is.
    pub fn append(&self, bytes: &[u8]) -> usize {
        self.lock().append(bytes)
    }

    /// Read up to `max_len` bytes from the read cursor and advance it.
    pub fn read(&self, max_len: usize) -> Bytes {
        self.lock().read(max_len)
    }

    /// Discard bytes `[0, offset)` and keep the rest.
    ///
    /// `offset` past the end discards everything. The read cursor moves down
    /// with the data and stops at zero if it pointed into the discarded part.
    pub fn remove_chunk(&self, offset: usize) {
        self.lock().remove_chunk(offset);
    }

    /// Discard everything that has already been read.
    pub fn compact(&self) {
        let mut inner = self.lock();
        let consumed = inner.read_pos;
        inner.remove_chunk(consumed);
    }

    /// Drop all data and rewind the read cursor.
    pub fn clear(&self) {
        self.lock().reset();
    }

    /// Position of the read cursor.
    pub fn read_position(&self) -> usize {
        self.lock().read_pos
    }

    /// Bytes stored (the write cursor).
    pub fn len(&self) -> usize {
        self.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().data.is_empty()
    }

    /// Bytes between the read cursor and the tail.
    pub fn available(&self) -> usize {
        let inner = self.lock();
        inner.data.len() - inner.read_pos
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic on the other side cannot leave `Inner` half-updated in a way
        // that breaks the cursor ordering, so keep going with the data.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Read for &StreamingBuffer {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let chunk = StreamingBuffer::read(*self, buf.len());
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl Write for &StreamingBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(self.append(buf))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
