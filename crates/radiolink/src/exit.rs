use std::fmt;
use std::io;

use radiolink_frame::FrameError;
use radiolink_station::StationError;
use radiolink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const CONFIG_INVALID: i32 = 78;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } | FrameError::UnsupportedCompression => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn station_error(context: &str, err: StationError) -> CliError {
    match err {
        StationError::Transport(err) => transport_error(context, err),
        StationError::Frame(err) => frame_error(context, err),
        StationError::Config(err) => CliError::new(CONFIG_INVALID, format!("{context}: {err}")),
        StationError::Io(err) => match err.kind() {
            io::ErrorKind::NotFound => CliError::new(CONFIG_INVALID, format!("{context}: {err}")),
            _ => io_error(context, err),
        },
        StationError::NotOpen => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_map_to_124() {
        let err = frame_error("receive failed", FrameError::Io(io::ErrorKind::WouldBlock.into()));
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn missing_port_is_transport_error() {
        let err = transport_error(
            "connect failed",
            TransportError::Connect {
                path: "/tmp/x.sock".into(),
                source: io::ErrorKind::NotFound.into(),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.starts_with("connect failed"));
    }

    #[test]
    fn oversize_is_data_invalid() {
        let err = frame_error(
            "encode failed",
            FrameError::PayloadTooLarge { size: 10, max: 1 },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn bad_config_is_config_invalid() {
        let err = station_error(
            "config",
            radiolink_station::StationConfig::from_json_str("{").unwrap_err(),
        );
        assert_eq!(err.code, CONFIG_INVALID);
    }
}
