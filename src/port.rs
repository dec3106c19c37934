//! Free-port discovery for the HTTP listener.
//!
//! The allocator probes a bounded window of consecutive ports by binding and
//! immediately releasing a listener on each one. The probe sockets are never
//! reused for the real server, so a port can in principle be taken between
//! the probe and the final bind; that case surfaces as a bind error at startup.

use std::fmt;
use std::net::TcpListener;
use tracing::trace;

/// Default first port to try
pub const DEFAULT_START_PORT: u16 = 8080;

/// Number of consecutive ports probed before giving up
pub const PORT_WINDOW: u16 = 100;

/// No port in the probed window could be bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    Exhausted { start: u16, window: u16 },
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortError::Exhausted { start, window } => write!(
                f,
                "no available ports found in {}..{} ({} tried)",
                start,
                u32::from(*start) + u32::from(*window),
                window
            ),
        }
    }
}

impl std::error::Error for PortError {}

/// Find the first bindable port in `start..start + PORT_WINDOW` on `host`
pub fn find_available_port(host: &str, start: u16) -> Result<u16, PortError> {
    find_available_port_in(host, start, PORT_WINDOW)
}

/// Find the first bindable port in `start..start + window` on `host`
///
/// Ports are tried in ascending order. The window is clipped at 65535.
///
/// # Errors
///
/// Returns [`PortError::Exhausted`] when every port in the window is taken.
pub fn find_available_port_in(host: &str, start: u16, window: u16) -> Result<u16, PortError> {
    let end = u32::from(start) + u32::from(window);
    for port in u32::from(start)..end.min(u32::from(u16::MAX) + 1) {
        let port = port as u16;
        match TcpListener::bind((host, port)) {
            Ok(listener) => {
                drop(listener);
                return Ok(port);
            }
            Err(e) => trace!(port, error = %e, "port unavailable"),
        }
    }
    Err(PortError::Exhausted { start, window })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_start_when_free() {
        let probe = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = probe.local_addr().unwrap().port();
        drop(probe);
        assert_eq!(find_available_port_in("127.0.0.1", port, 1), Ok(port));
    }

    #[test]
    fn test_exhausted_window_errors() {
        let held = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = held.local_addr().unwrap().port();
        assert_eq!(
            find_available_port_in("127.0.0.1", port, 1),
            Err(PortError::Exhausted {
                start: port,
                window: 1
            })
        );
    }

    #[test]
    fn test_error_message_names_range() {
        let err = PortError::Exhausted {
            start: 8080,
            window: 100,
        };
        assert_eq!(
            err.to_string(),
            "no available ports found in 8080..8180 (100 tried)"
        );
    }
}
