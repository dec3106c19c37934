//! # CLI Module
//!
//! Command-line entry point for the `scrolly` binary.
//!
//! ## Modes
//!
//! ### Presentation (default)
//!
//! ```bash
//! scrolly
//! ```
//!
//! Picks a free port, serves the site, opens the default browser and exits
//! once the browser tab closes or the page asks to quit.
//!
//! ### Persistent server
//!
//! ```bash
//! scrolly --server
//! ```
//!
//! Serves until interrupted. No browser is opened and the control endpoints
//! are not routed.
//!
//! Bundle locations, the start port and logging come from `SCROLLY_*`
//! environment variables; see [`crate::runtime_config`] and
//! [`crate::telemetry`].
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use scrolly::cli::{run_cli, Cli};
//! use scrolly::runtime_config::RuntimeConfig;
//! use clap::Parser;
//!
//! run_cli(Cli::parse(), RuntimeConfig::from_env())?;
//! ```

mod commands;


pub use commands::{banner, launch, run_cli, Cli, Launched};
