use crate::assets::{MemoryStore, OverlayStore};
use crate::browser::open_browser;
use crate::config::{AppConfig, ServeMode};
use crate::error::StartupError;
use crate::lifecycle::{LifecycleController, ProcessExit, Terminator};
use crate::port::find_available_port;
use crate::runtime_config::RuntimeConfig;
use crate::server::{AppService, HttpServer, ServerHandle};
use clap::Parser;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Serve a presentation bundle
#[derive(Parser, Debug)]
#[command(name = "scrolly", version)]
#[command(about = "Serve a scrolly presentation", long_about = None)]
pub struct Cli {
    /// Run in server mode (no auto-open browser, no auto-shutdown)
    #[arg(long, default_value_t = false)]
    pub server: bool,
}

impl Cli {
    pub fn mode(&self) -> ServeMode {
        ServeMode::from_server_flag(self.server)
    }
}

/// A server that is up and accepting connections
pub struct Launched {
    pub mode: ServeMode,
    pub port: u16,
    pub url: String,
    pub config: AppConfig,
    pub handle: ServerHandle,
}

fn mount(dir: &Path) -> Result<MemoryStore, StartupError> {
    let store = MemoryStore::load_dir(dir).map_err(|source| StartupError::AssetMount {
        bundle: dir.to_path_buf(),
        source,
    })?;
    info!(bundle = %dir.display(), files = store.file_count(), "mounted asset bundle");
    Ok(store)
}

/// Pick a port, load both bundles and start serving
///
/// `terminator` ends the process in presentation mode; it is unused in
/// server mode.
///
/// # Errors
///
/// Returns a [`StartupError`] when no port is free, a bundle cannot be
/// loaded or the listener cannot be bound.
pub fn launch(
    mode: ServeMode,
    runtime: &RuntimeConfig,
    terminator: Arc<dyn Terminator>,
) -> Result<Launched, StartupError> {
    let port = find_available_port(&runtime.bind_host, runtime.start_port)?;

    let site = mount(&runtime.site_dir)?;
    let lib = mount(&runtime.lib_dir)?;
    let overlay = Arc::new(OverlayStore::new(site, lib));
    let config = AppConfig::load(overlay.as_ref());

    let lifecycle = (mode == ServeMode::Presentation)
        .then(|| Arc::new(LifecycleController::new(terminator)));
    let assets = AppService::asset_pipeline(overlay, mode.host_kind());
    let service = AppService::new(Box::new(assets), lifecycle);

    let addr = format!("{}:{port}", runtime.bind_host);
    let handle = HttpServer(service)
        .start(addr.as_str())
        .map_err(|source| StartupError::Bind { addr, source })?;
    // start_port 0 lets the OS pick.
    let port = handle.local_addr().port();

    let url = format!("http://localhost:{port}");
    info!(?mode, %url, title = %config.title, "server started");
    Ok(Launched {
        mode,
        port,
        url,
        config,
        handle,
    })
}

/// The two lines printed to stdout once the server is up
pub fn banner(mode: ServeMode, url: &str, port: u16) -> [String; 2] {
    match mode {
        ServeMode::Presentation => [
            format!("Opening presentation at {url} (port {port})"),
            "Close the browser when done, or press Ctrl+C to quit".to_string(),
        ],
        ServeMode::Server => [
            format!("Server running at {url} (port {port})"),
            "Press Ctrl+C to quit".to_string(),
        ],
    }
}

/// Run until the process is terminated
///
/// # Errors
///
/// Returns an error if startup fails or the accept coroutine panics.
pub fn run_cli(cli: Cli, runtime: RuntimeConfig) -> anyhow::Result<()> {
    may::config().set_stack_size(runtime.stack_size);

    let launched = launch(cli.mode(), &runtime, Arc::new(ProcessExit))?;

    #[cfg(unix)]
    crate::lifecycle::signals::install_exit_on_signal()?;

    for line in banner(launched.mode, &launched.url, launched.port) {
        println!("{line}");
    }

    if launched.mode == ServeMode::Presentation && runtime.open_browser {
        open_browser(&launched.url);
    }

    launched
        .handle
        .join()
        .map_err(|e| io::Error::other(format!("accept loop panicked: {e:?}")))?;
    Ok(())
}
