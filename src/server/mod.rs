//! # Server Module
//!
//! The HTTP front door: a coroutine-per-connection HTTP/1.1 server on the
//! `may` runtime and the [`AppService`] that routes requests to the asset
//! pipeline and the lifecycle endpoints.
//!
//! ## Request path
//!
//! ```text
//! TcpListener ─► connection coroutine ─► read_request ─► AppService
//!                                                          ├─ /ws        ─► control channel (presentation mode)
//!                                                          ├─ /shutdown  ─► lifecycle controller (presentation mode)
//!                                                          └─ anything   ─► TracingMiddleware ─► InjectScripts ─► StaticFiles ─► overlay
//! ```

mod core;
pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use self::core::{Handler, HttpService, Outcome, UpgradeFn};
pub use http_server::{serve_connection, HttpServer, ServerHandle};
pub use request::{read_request, ParsedRequest};
pub use response::{set_content_length, status_allows_body, write_text_error, ResponseWriter, StreamWriter};
pub use service::{AppService, CONTROL_PATH, SHUTDOWN_PATH};
