//! Request-path middleware.
//!
//! Middleware here are [`Handler`](crate::server::Handler) decorators: each
//! owns an inner handler and decides what writer the inner handler sees.
//!
//! - [`InjectScripts`] buffers HTML candidates and splices helper scripts in
//! - [`TracingMiddleware`] wraps the writer to log status and latency

mod inject;
mod tracing;

pub use inject::{CaptureWriter, InjectScripts};
pub use self::tracing::TracingMiddleware;
