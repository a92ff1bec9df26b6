//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_NAME: &str = "solstice";
const CONFIG_FILE: &str = "config.ron";

/// Top-level demo configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering settings.
    pub render: RenderConfig,
    /// Scene asset locations.
    pub scene: SceneConfig,
    /// Orbit camera pose and drag sensitivity.
    pub camera: CameraConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Shadow map edge length in texels (the map is square).
    pub shadow_map_resolution: u32,
    /// Luminance above which the cutoff pass keeps a pixel.
    pub cutoff_threshold: f32,
    /// Texel step multiplier for the Gaussian blur taps.
    pub blur_radius: f32,
    /// Amplitude of the time-varying UV wobble in the composite pass.
    pub distortion_strength: f32,
    /// Clear color of the main offscreen target (RGBA).
    pub scene_clear_color: [f32; 4],
}

/// Scene asset configuration. Relative paths resolve against `asset_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Root directory for all scene assets.
    pub asset_dir: PathBuf,
    /// Terrain/island model.
    pub world: PathBuf,
    /// Water plane model.
    pub water: PathBuf,
    /// Daytime skybox model.
    pub skybox_day: PathBuf,
    /// Nighttime skybox model.
    pub skybox_night: PathBuf,
    /// Vehicle model.
    pub vehicle: PathBuf,
    /// Environment cube map faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub cube_map: [PathBuf; 6],
}

/// Orbit camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial azimuth in radians.
    pub theta: f32,
    /// Initial polar angle in radians.
    pub phi: f32,
    /// Initial orbit radius.
    pub radius: f32,
    /// Initial height of the look-at point.
    pub target_altitude: f32,
    /// Degrees of rotation per pixel of left-button drag.
    pub rotate_degrees_per_pixel: f32,
    /// Radius change per pixel of middle-button drag.
    pub zoom_per_pixel: f32,
    /// Look-at altitude change per pixel of right-button drag.
    pub altitude_per_pixel: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write a JSON log file next to the config in debug builds.
    pub log_to_file: bool,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 512,
            vsync: true,
            title: "Solstice".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shadow_map_resolution: 1024,
            cutoff_threshold: 0.75,
            blur_radius: 1.0,
            distortion_strength: 0.004,
            scene_clear_color: [0.2, 0.2, 0.8, 1.0],
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            world: PathBuf::from("scenes/island2.obj"),
            water: PathBuf::from("scenes/water.obj"),
            skybox_day: PathBuf::from("scenes/skybox.obj"),
            skybox_night: PathBuf::from("scenes/skyboxnight.obj"),
            vehicle: PathBuf::from("scenes/car.obj"),
            cube_map: [
                PathBuf::from("cube0.png"),
                PathBuf::from("cube1.png"),
                PathBuf::from("cube2.png"),
                PathBuf::from("cube3.png"),
                PathBuf::from("cube4.png"),
                PathBuf::from("cube5.png"),
            ],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            theta: std::f32::consts::FRAC_PI_6,
            phi: std::f32::consts::FRAC_PI_4,
            radius: 30.0,
            target_altitude: 5.2,
            rotate_degrees_per_pixel: 0.3,
            zoom_per_pixel: 0.3,
            altitude_per_pixel: 0.1,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: true,
        }
    }
}

impl SceneConfig {
    /// Resolve an asset path against `asset_dir`. Absolute paths pass through.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_dir.join(path)
        }
    }

    /// Resolved paths of the six cube map faces.
    pub fn cube_map_paths(&self) -> [PathBuf; 6] {
        std::array::from_fn(|i| self.resolve(&self.cube_map[i]))
    }
}

/// Platform config directory for the demo (`<os config dir>/solstice`).
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 800"));
        assert!(ron_str.contains("shadow_map_resolution: 1024"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.camera.radius = 12.5;
        config.scene.asset_dir = PathBuf::from("/srv/solstice");
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (width: 1024), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 512);
        assert_eq!(config.render, RenderConfig::default());
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.render.cutoff_threshold = 0.9;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_scene_paths_resolve_against_asset_dir() {
        let scene = SceneConfig::default();
        assert_eq!(
            scene.resolve(&scene.world),
            PathBuf::from("assets/scenes/island2.obj")
        );
        let faces = scene.cube_map_paths();
        assert_eq!(faces[5], PathBuf::from("assets/cube5.png"));
    }

    #[test]
    fn test_absolute_scene_path_is_kept() {
        let scene = SceneConfig::default();
        let absolute = std::env::temp_dir().join("car.obj");
        assert_eq!(scene.resolve(&absolute), absolute);
    }

    #[test]
    fn test_default_camera_pose() {
        let camera = CameraConfig::default();
        assert!((camera.theta - std::f32::consts::PI / 6.0).abs() < 1e-6);
        assert!((camera.phi - std::f32::consts::PI / 4.0).abs() < 1e-6);
        assert_eq!(camera.radius, 30.0);
        assert_eq!(camera.target_altitude, 5.2);
    }
}
