//! Logger setup for the terminal front end.
//!
//! Terminal logging shares stdout with the prompt, so the default target is
//! the log file named in the config.

use log::LevelFilter;

use super::config::AppConfig;

pub fn initialize(config: &AppConfig) {
    if !rosterwatch_logging::initialize(config.log_destination(), LevelFilter::Info, &config.log_file)
    {
        eprintln!("Warning: logging is disabled");
    }
}
