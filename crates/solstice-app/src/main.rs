//! Solstice demo binary.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p solstice-app -- --assets ./assets` to point at the scene files.

use std::process::ExitCode;

use clap::Parser;
use solstice_config::{CliArgs, Config, default_config_dir};
use tracing::{error, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().or_else(|| default_config_dir().ok());
    let (mut config, load_error) = match config_dir.as_deref().map(Config::load_or_create) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (Config::default(), Some(e.to_string())),
        None => (Config::default(), Some("no config directory".to_string())),
    };
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.as_ref().map(|dir| dir.join("logs"));
    solstice_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));
    if let Some(e) = load_error {
        warn!("Failed to load config: {e}, using defaults");
    }

    match solstice_app::run(config) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e}");
            ExitCode::from(1)
        }
    }
}
