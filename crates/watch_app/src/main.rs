mod app;
mod config;

use anyhow::Context;
use watch_logging::LogDestination;

use crate::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let destination = match &config.log_file {
        Some(path) => LogDestination::TerminalAndFile(path.clone()),
        None => LogDestination::Terminal,
    };
    watch_logging::initialize(config.level(), destination);

    // Strictly sequential: every fetch and send is awaited in turn.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(app::run_single_cycle(&config))?;
    Ok(())
}
