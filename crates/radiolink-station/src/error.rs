/// Errors that can occur in station operations.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// Transport-level error, including failure to open the port.
    #[error("transport error: {0}")]
    Transport(#[from] radiolink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] radiolink_frame::FrameError),

    /// The operation needs an open port.
    #[error("station port is not open")]
    NotOpen,

    /// The station configuration could not be parsed.
    #[error("invalid station config: {0}")]
    Config(#[from] serde_json::Error),

    /// I/O error outside the link itself (config files, audio devices).
    #[error("station I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StationError>;
