//! Station runtime for radiolink.
//!
//! This is the "just works" layer. Open a port, write text and audio to other
//! stations, and pick accepted messages off a queue while audio and status
//! changes arrive as [`StationEvents`].

pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod phone_log;
pub mod queue;
pub mod station;

pub use audio::{AudioCapture, AudioPlayback, PcmSink, PcmSource, PlaybackState};
pub use config::StationConfig;
pub use error::{Result, StationError};
pub use events::{EventChannel, NoEvents, StationEvent, StationEvents};
pub use phone_log::{Contact, PhoneLog};
pub use queue::MessageQueue;
pub use station::Station;
