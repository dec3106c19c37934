//! # scrolly
//!
//! **scrolly** serves a bundled scroll-driven presentation over HTTP. A site
//! bundle is layered over a shared library bundle, every HTML page is
//! rewritten on the way out to pull in helper scripts, and in presentation
//! mode the process lives exactly as long as the browser tab showing it.
//!
//! ## Architecture
//!
//! - **[`assets`]** - `ByteStore` trait, in-memory bundles and the override/fallback overlay
//! - **[`port`]** - first free TCP port in a 100-port window
//! - **[`content`]** - HTML classification, script injection and content sniffing
//! - **[`static_files`]** - files, directory indexes and listings from any store
//! - **[`middleware`]** - request logging and the response-rewriting injector
//! - **[`shell`]** - asset handler for a native desktop shell
//! - **[`lifecycle`]** - browser-tied process lifetime (control channel, shutdown, signals)
//! - **[`server`]** - coroutine HTTP/1.1 server on `may` and the top-level router
//! - **[`config`]** / **[`runtime_config`]** - YAML presentation config and environment settings
//! - **[`telemetry`]** - `tracing` subscriber setup
//! - **[`cli`]** - the `scrolly` command line
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Browser
//!     participant Server as HttpServer<br/>(may coroutine)
//!     participant App as AppService
//!     participant Inject as InjectScripts
//!     participant Files as StaticFiles
//!     participant Overlay as OverlayStore
//!
//!     Browser->>Server: GET /
//!     Server->>App: ParsedRequest
//!     App->>Inject: not /ws or /shutdown
//!     Inject->>Files: serve into capture buffer
//!     Files->>Overlay: stat / open "index.html"
//!     Overlay-->>Files: site bytes, else library bytes
//!     Files-->>Inject: 200 + body
//!     Inject->>Inject: HTML? inject before </body>
//!     Inject-->>Browser: 200 text/html (rewritten)
//!
//!     Browser->>Server: GET /ws (Upgrade: websocket)
//!     Server->>App: handshake
//!     App-->>Browser: 101 Switching Protocols
//!     Note over Browser,App: heartbeat every 5s until the tab closes
//!     Browser--xApp: connection drops
//!     App->>App: terminate after 500ms grace
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use scrolly::assets::{MemoryStore, OverlayStore};
//! use scrolly::server::{AppService, HttpServer};
//!
//! let site = MemoryStore::load_dir("site").unwrap();
//! let lib = MemoryStore::load_dir("lib").unwrap();
//! let service = AppService::persistent(OverlayStore::new(site, lib));
//! let handle = HttpServer(service).start("127.0.0.1:8080").unwrap();
//! handle.join().unwrap();
//! ```

pub mod assets;
pub mod browser;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod port;
pub mod runtime_config;
pub mod server;
pub mod shell;
pub mod static_files;
pub mod telemetry;

pub use assets::{ByteStore, MemoryStore, OverlayStore};
pub use config::{AppConfig, ServeMode};
pub use error::StartupError;
