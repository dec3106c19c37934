//! Ctrl+C and SIGTERM end the process cleanly in either mode.

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::io;
use std::thread;
use tracing::info;

/// Exit with status 0 on the first SIGINT or SIGTERM
///
/// The listener runs on its own OS thread so it never competes with
/// connection coroutines.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be registered.
pub fn install_exit_on_signal() -> io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::Builder::new()
        .name("scrolly-signals".into())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!(signal = sig, "received signal, exiting");
                std::process::exit(0);
            }
        })?;
    Ok(())
}
