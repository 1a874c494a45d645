//! Station-addressed framing for a byte-stream radio link.
//!
//! Every frame is a fixed 20-byte header followed by the payload:
//! - Two copies of the `0xDEADBEEF` signature for stream synchronization
//! - Compressed and uncompressed payload lengths
//! - The receiving station id, a format version, the decode options and an XOR key
//!
//! Text payloads travel as checksummed 138-byte [`Message`] records. Any payload
//! may be run-length compressed and XOR obscured. The [`FrameReceiver`]
//! reassembles frames from arbitrarily split deliveries and hands them to a
//! [`FrameSink`].

pub mod checksum;
#[cfg(feature = "async")]
pub mod codec;
pub mod config;
pub mod encoder;
pub mod error;
pub mod header;
pub mod message;
pub mod options;
pub mod reader;
pub mod receiver;
pub mod rle;
pub mod stream_buffer;
pub mod writer;
pub mod xor;

#[cfg(feature = "async")]
pub use codec::{LinkCodec, Outbound};
pub use config::{EncoderConfig, FrameConfig, ReceiverConfig, DEFAULT_MAX_PAYLOAD};
pub use encoder::FrameEncoder;
pub use error::{FrameError, Result};
pub use header::{FrameHeader, HEADER_SIZE, SIGNATURE, VERSION};
pub use message::{Message, MESSAGE_SIZE, TEXT_CAPACITY};
pub use options::{Compression, DecodeOptions, Encryption, MessageClass};
pub use reader::LinkReader;
pub use receiver::{Delivery, FrameReceiver, FrameSink, ReceiverState, ReceiverStats};
pub use rle::RleError;
pub use stream_buffer::StreamingBuffer;
pub use writer::FrameWriter;
