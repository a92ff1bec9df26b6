//! Structured logging for the Solstice demo.
//!
//! Console output with uptime timestamps and module paths, plus a JSON log
//! file in debug builds. The filter comes from `RUST_LOG` when set, otherwise
//! from the config's `debug.log_level`, with wgpu and naga kept at `warn`.
//! Crates that log through the `log` facade are bridged by the subscriber.

use solstice_config::Config;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Noise filter applied to GPU backend crates regardless of the base level.
const GPU_NOISE_FILTER: &str = "wgpu=warn,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "solstice.log";

/// Build the filter directive string for a base level.
///
/// An empty level falls back to `info`.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    let level = if level.is_empty() { "info" } else { level };
    format!("{level},{GPU_NOISE_FILTER}")
}

/// Create the JSON log file when file logging applies.
///
/// Returns `None` in release builds, when the config turns file logging off,
/// without a directory, or when the file cannot be created.
pub fn open_log_file(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&Config>,
) -> Option<std::fs::File> {
    let file_enabled = config.is_none_or(|c| c.debug.log_to_file);
    if !debug_build || !file_enabled {
        return None;
    }
    let log_dir = log_dir?;
    std::fs::create_dir_all(log_dir).ok()?;
    std::fs::File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - whether file logging is allowed
/// * `config` - optional config supplying the log level and file toggle
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = config
        .map(|c| filter_directives(&c.debug.log_level))
        .unwrap_or_else(|| filter_directives("info"));
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(log_file) = open_log_file(log_dir, debug_build, config) {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// `EnvFilter` with the default directives (`info` plus GPU noise filter).
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(filter_directives("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_gpu_crates() {
        let filter_str = format!("{}", default_env_filter());
        assert!(filter_str.contains("wgpu=warn"));
        assert!(filter_str.contains("naga=warn"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_filter_directives_use_config_level() {
        let mut config = Config::default();
        config.debug.log_level = "debug,solstice_render=trace".to_string();
        let directives = filter_directives(&config.debug.log_level);
        assert!(directives.starts_with("debug,solstice_render=trace,"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_empty_level_falls_back_to_info() {
        assert!(filter_directives("  ").starts_with("info,"));
    }

    #[test]
    fn test_log_file_created_in_debug_builds() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_dir = temp_dir.path().join("logs");
        assert!(open_log_file(Some(&log_dir), true, Some(&Config::default())).is_some());
        assert!(log_dir.join(LOG_FILE_NAME).is_file());
    }

    #[test]
    fn test_log_file_skipped_in_release_builds() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(open_log_file(Some(temp_dir.path()), false, None).is_none());
        assert!(!temp_dir.path().join(LOG_FILE_NAME).exists());
    }

    #[test]
    fn test_log_file_skipped_when_disabled_in_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.debug.log_to_file = false;
        assert!(open_log_file(Some(temp_dir.path()), true, Some(&config)).is_none());
        assert!(!temp_dir.path().join(LOG_FILE_NAME).exists());
    }

    #[test]
    fn test_log_file_needs_a_directory() {
        assert!(open_log_file(None, true, None).is_none());
    }
}
