//! Configuration system for the Solstice demo.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line via clap. Every section uses `#[serde(default)]` so older or
//! partial files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, Config, DebugConfig, RenderConfig, SceneConfig, WindowConfig, default_config_dir,
};
pub use error::ConfigError;
