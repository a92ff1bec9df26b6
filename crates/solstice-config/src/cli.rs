//! Command-line argument parsing for the Solstice demo.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Solstice command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "solstice", about = "Shadowed day/night island with bloom post-processing")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Enable or disable vsync.
    #[arg(long)]
    pub vsync: Option<bool>,

    /// Directory containing scene models, textures and cube map faces.
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Shadow map resolution in texels.
    #[arg(long)]
    pub shadow_resolution: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(vsync) = args.vsync {
            self.window.vsync = vsync;
        }
        if let Some(ref dir) = args.assets {
            self.scene.asset_dir = dir.clone();
        }
        if let Some(res) = args.shadow_resolution {
            self.render.shadow_map_resolution = res;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
