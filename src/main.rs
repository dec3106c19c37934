use clap::Parser;
use scrolly::cli::{run_cli, Cli};
use scrolly::runtime_config::RuntimeConfig;
use scrolly::telemetry::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env())?;
    let runtime = RuntimeConfig::from_env();
    if let Err(e) = run_cli(cli, runtime) {
        tracing::error!(error = %e, "startup failed");
        return Err(e);
    }
    Ok(())
}
