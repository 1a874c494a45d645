use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::traits::LinkStream;

/// Which end of the link this station opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortMode {
    /// Connect to a link somebody else is listening on.
    #[default]
    Connect,
    /// Bind the link path and wait for the far end to attach.
    Listen,
}

/// Port settings used to open one end of a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    /// Filesystem path of the link.
    pub path: PathBuf,
    /// Connect or listen.
    pub mode: PortMode,
    /// Read timeout applied to the opened link.
    pub read_timeout: Option<Duration>,
    /// Write timeout applied to the opened link.
    pub write_timeout: Option<Duration>,
}

impl PortConfig {
    /// Settings for connecting to `path` with no timeouts.
    pub fn connect(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: PortMode::Connect,
            read_timeout: None,
            write_timeout: None,
        }
    }

    /// Settings for listening on `path` with no timeouts.
    pub fn listen(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: PortMode::Listen,
            ..Self::connect(path)
        }
    }
}

/// Open one end of a link.
///
/// In [`PortMode::Listen`] this blocks until the far end attaches. The
/// listening socket lives only until that first peer is accepted.
#[cfg(unix)]
pub fn open(config: &PortConfig) -> Result<LinkStream> {
    let stream = match config.mode {
        PortMode::Connect => crate::uds::UnixLink::connect(&config.path)?,
        PortMode::Listen => crate::uds::UnixLink::bind(&config.path)?.accept()?,
    };
    stream.set_read_timeout(config.read_timeout)?;
    stream.set_write_timeout(config.write_timeout)?;
    info!(path = ?config.path, mode = ?config.mode, "port opened");
    Ok(stream)
}
