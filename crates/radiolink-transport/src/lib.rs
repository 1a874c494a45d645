//! Duplex byte-link abstraction for radiolink stations.
//!
//! A station talks to its peers over a single full-duplex byte channel. On
//! the air that is a serial radio modem; here the channel is anything that
//! implements `Read + Write`, with a Unix domain socket standing in for the
//! serial port:
//! - [`LinkStream`] is the connected channel handed to the frame layer
//! - [`UnixLink`] binds, accepts and connects socket links
//! - [`PortConfig`] and [`open`] describe and open one end of a link
//!
//! Nothing here knows about frames. Bytes go in, bytes come out, in whatever
//! chunk sizes the channel feels like delivering.

pub mod config;
pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use config::{PortConfig, PortMode};
pub use error::{Result, TransportError};
pub use traits::LinkStream;

#[cfg(unix)]
pub use config::open;
#[cfg(unix)]
pub use uds::UnixLink;
