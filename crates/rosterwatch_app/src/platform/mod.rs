//! Terminal front end: config, logging, and the stdin-driven event loop.
mod app;
mod commands;
mod config;
mod logging;
mod render;

use std::path::PathBuf;

use rosterwatch_logging::rw_info;

pub fn run_app() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::CONFIG_FILENAME));
    let config = config::load_config(&config_path);
    logging::initialize(&config);
    rw_info!("Starting with config {:?}", config_path);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run(config))
}
