//! Startup failures. Each one ends the process with a non-zero exit status.

use crate::assets::AssetError;
use crate::port::PortError;
use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StartupError {
    /// Every port in the probe window was taken
    NoAvailablePort(PortError),
    /// An asset bundle directory could not be loaded
    AssetMount { bundle: PathBuf, source: AssetError },
    /// The chosen port could not be bound by the server
    Bind { addr: String, source: io::Error },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::NoAvailablePort(e) => write!(f, "failed to find available port: {e}"),
            StartupError::AssetMount { bundle, source } => {
                write!(f, "failed to mount asset bundle {}: {source}", bundle.display())
            }
            StartupError::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::NoAvailablePort(e) => Some(e),
            StartupError::AssetMount { source, .. } => Some(source),
            StartupError::Bind { source, .. } => Some(source),
        }
    }
}

impl From<PortError> for StartupError {
    fn from(e: PortError) -> Self {
        StartupError::NoAvailablePort(e)
    }
}
