use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use radiolink_transport::LinkStream;
use tracing::trace;

use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::receiver::{Delivery, FrameReceiver, FrameSink};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Pulls bytes off a link and feeds them to a [`FrameReceiver`].
///
/// [`LinkReader::poll`] is the "data available" handler: one read, one
/// delivery to the receiver, however many frames that completes.
/// [`LinkReader::read_delivery`] blocks until the next decoded frame.
pub struct LinkReader<T> {
    inner: T,
    receiver: FrameReceiver,
    pending: VecDeque<Delivery>,
}

impl<T: Read> LinkReader<T> {
    pub fn new(inner: T, receiver: FrameReceiver) -> Self {
        Self {
            inner,
            receiver,
            pending: VecDeque::new(),
        }
    }

    /// Read whatever the link has and dispatch completed frames to `sink`.
    ///
    /// Returns the number of frames dispatched, which is often zero.
    /// Returns `Err(FrameError::ConnectionClosed)` when the link reports EOF.
    pub fn poll<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        };
        trace!(read, "link data available");
        Ok(self.receiver.on_bytes_available(&chunk[..read], sink))
    }

    /// Block until the next frame is decoded.
    ///
    /// Frames completed by the same read are queued and returned by later
    /// calls without touching the link.
    pub fn read_delivery(&mut self) -> Result<Delivery> {
        loop {
            if let Some(delivery) = self.pending.pop_front() {
                return Ok(delivery);
            }
            let mut pending = std::mem::take(&mut self.pending);
            let result = self.poll(&mut pending);
            self.pending = pending;
            result?;
        }
    }

    pub fn receiver(&self) -> &FrameReceiver {
        &self.receiver
    }

    pub fn receiver_mut(&mut self) -> &mut FrameReceiver {
        &mut self.receiver
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the link.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl LinkReader<LinkStream> {
    /// Create a reader for a `LinkStream` and apply the read timeout from config.
    pub fn with_config_link(
        inner: LinkStream,
        receiver: FrameReceiver,
        config: &FrameConfig,
    ) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::new(inner, receiver))
    }
}

pub(crate) fn transport_to_frame_error(err: radiolink_transport::TransportError) -> FrameError {
    match err {
        radiolink_transport::TransportError::Io(io)
        | radiolink_transport::TransportError::Accept(io) => FrameError::Io(io),
        radiolink_transport::TransportError::Bind { source, .. }
        | radiolink_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        radiolink_transport::TransportError::Closed => FrameError::ConnectionClosed,
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
