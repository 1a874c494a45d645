//! Station-addressed text and audio messaging over a byte-stream radio link.
//!
//! radiolink frames text messages and PCM audio for a shared half-duplex
//! channel, addresses them to stations, and reassembles them on the far side
//! however the channel chops up the bytes.
//!
//! # Crate Structure
//!
//! - [`transport`]: the duplex byte link (Unix sockets standing in for a serial port)
//! - [`frame`]: headers, message records, RLE, XOR, checksums and the frame receiver
//! - [`station`]: message queue, phone log, events and audio staging (behind `station` feature)

/// Re-export transport types.
pub mod transport {
    pub use radiolink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use radiolink_frame::*;
}

/// Re-export station types (requires `station` feature).
#[cfg(feature = "station")]
pub mod station {
    pub use radiolink_station::*;
}
