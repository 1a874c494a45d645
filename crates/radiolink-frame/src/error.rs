use crate::rle::RleError;

/// Errors that can occur during frame encoding/decoding.
///
/// On the receive path none of these escape to the caller: the receiver logs
/// them, counts them and resynchronizes. They surface as `Err` only from the
/// encoder, the writer, the link reader and the standalone decode helpers.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// One or both header signatures are not `0xDEADBEEF`, or they disagree.
    #[error("invalid frame signature ({signature:#010x}/{signature2:#010x})")]
    InvalidSignature { signature: u32, signature2: u32 },

    /// The header carries a version this implementation does not speak.
    #[error("unsupported header version {0}")]
    UnsupportedVersion(u8),

    /// The decode options byte has an unknown class or reserved bits set.
    #[error("invalid decode options {0:#04x}")]
    InvalidDecodeOptions(u8),

    /// The frame is addressed to another station and is not a broadcast.
    #[error("frame addressed to station {receiver}, this is station {station}")]
    NotAddressed { receiver: u8, station: u8 },

    /// A declared or actual payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The text record checksum does not match its contents.
    #[error("checksum mismatch (record says {expected}, computed {actual})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// The decode buffer could not be allocated.
    #[error("failed to allocate {size} byte decode buffer")]
    AllocationFailure { size: usize },

    /// The run-length payload is corrupt.
    #[error("run-length decode failed: {0}")]
    Compression(#[from] RleError),

    /// Huffman compression is reserved but not implemented.
    #[error("huffman compression is not supported")]
    UnsupportedCompression,

    /// A text-class payload is not exactly one message record long.
    #[error("malformed message record ({len} bytes, expected {expected})")]
    MalformedMessage { len: usize, expected: usize },

    /// An I/O error occurred while reading or writing the link.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link was closed while reading or writing.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
