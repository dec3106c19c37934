//! Presentation configuration and serve mode.
//!
//! [`AppConfig`] is read through the overlay, so a site's `config.yaml`
//! shadows the library's `config.default.yaml`. Fields missing from the file
//! keep their defaults.

use crate::assets::ByteStore;
use crate::content::HostKind;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Config file looked up first (normally provided by the site)
pub const CONFIG_FILE: &str = "config.yaml";

/// Config file looked up when [`CONFIG_FILE`] is absent (normally provided by the library)
pub const DEFAULT_CONFIG_FILE: &str = "config.default.yaml";

/// How the process is tied to its clients; chosen once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeMode {
    /// Opens a browser and exits when the tab goes away
    Presentation,
    /// Runs until interrupted
    Server,
}

impl ServeMode {
    pub fn from_server_flag(server: bool) -> Self {
        if server {
            ServeMode::Server
        } else {
            ServeMode::Presentation
        }
    }

    pub fn host_kind(self) -> HostKind {
        match self {
            ServeMode::Presentation => HostKind::Presentation,
            ServeMode::Server => HostKind::Server,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Scrolly".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

/// Presentation metadata used by hosts (window title and size, app identity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub window: WindowConfig,
    pub app: AppInfo,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Scrolly Presentation".to_string(),
            window: WindowConfig::default(),
            app: AppInfo::default(),
        }
    }
}

impl AppConfig {
    /// Load from `store`, falling back to defaults on any failure
    pub fn load(store: &dyn ByteStore) -> Self {
        let (name, bytes) = match store.open(CONFIG_FILE) {
            Ok(bytes) => (CONFIG_FILE, bytes),
            Err(_) => match store.open(DEFAULT_CONFIG_FILE) {
                Ok(bytes) => (DEFAULT_CONFIG_FILE, bytes),
                Err(_) => {
                    info!("No config file found, using defaults");
                    return Self::default();
                }
            },
        };

        match Self::parse(&bytes) {
            Ok(config) => {
                info!(file = name, title = %config.title, "loaded config");
                config
            }
            Err(e) => {
                warn!(file = name, error = %e, "Error parsing config, using defaults");
                Self::default()
            }
        }
    }

    /// Parse YAML; an empty document yields the defaults
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_yaml::from_slice(bytes)
    }
}
