//! # Runtime Configuration Module
//!
//! Environment-variable configuration read once at startup.
//!
//! ## Environment Variables
//!
//! ### `SCROLLY_STACK_SIZE`
//!
//! Stack size for connection coroutines. Accepts decimal (`65536`) or
//! hexadecimal (`0x10000`). Default: `0x10000` (64 KB).
//!
//! ### `SCROLLY_PORT`
//!
//! First port probed; the next 99 are tried after it. Default: `8080`.
//!
//! ### `SCROLLY_BIND`
//!
//! Host the listener binds. Default: `0.0.0.0`.
//!
//! ### `SCROLLY_SITE_DIR` / `SCROLLY_LIB_DIR`
//!
//! Directories loaded into the override and fallback stores. Defaults:
//! `site` and `lib`.
//!
//! ### `SCROLLY_OPEN_BROWSER`
//!
//! `false`, `0`, `no` or `off` keeps presentation mode from launching a
//! browser. Default: on.
//!
//! ## Usage
//!
//! ```rust
//! use scrolly::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use crate::port::DEFAULT_START_PORT;
use std::env;
use std::path::PathBuf;

const DEFAULT_STACK_SIZE: usize = 0x10000;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_SITE_DIR: &str = "site";
const DEFAULT_LIB_DIR: &str = "lib";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
    /// First port of the probe window
    pub start_port: u16,
    pub bind_host: String,
    /// Override ("site") bundle directory
    pub site_dir: PathBuf,
    /// Fallback ("library") bundle directory
    pub lib_dir: PathBuf,
    pub open_browser: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            start_port: DEFAULT_START_PORT,
            bind_host: DEFAULT_BIND.to_string(),
            site_dir: PathBuf::from(DEFAULT_SITE_DIR),
            lib_dir: PathBuf::from(DEFAULT_LIB_DIR),
            open_browser: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            stack_size: lookup("SCROLLY_STACK_SIZE")
                .and_then(|v| parse_size(&v))
                .unwrap_or(defaults.stack_size),
            start_port: lookup("SCROLLY_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.start_port),
            bind_host: lookup("SCROLLY_BIND")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.bind_host),
            site_dir: lookup("SCROLLY_SITE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.site_dir),
            lib_dir: lookup("SCROLLY_LIB_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.lib_dir),
            open_browser: lookup("SCROLLY_OPEN_BROWSER")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.open_browser),
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

fn parse_flag(val: &str) -> bool {
    !matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
