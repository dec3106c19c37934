//! Launching the user's browser for presentation mode.

use std::thread;
use tracing::{debug, warn};

/// Open `url` in the default browser without blocking the caller
///
/// Failure is logged; the server keeps running and the URL is already on
/// stdout.
pub fn open_browser(url: &str) {
    let url = url.to_string();
    let spawned = thread::Builder::new()
        .name("scrolly-browser".into())
        .spawn(move || match open::that(&url) {
            Ok(()) => debug!(%url, "browser launched"),
            Err(e) => warn!(%url, error = %e, "Failed to open browser"),
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to spawn browser launcher");
    }
}
