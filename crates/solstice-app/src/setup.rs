//! Translation of the loaded [`Config`] into the types the animation and
//! render crates consume.

use solstice_animation::{DragSensitivity, OrbitCamera, OrchestratorState};
use solstice_config::{CameraConfig, Config};
use solstice_render::{PostSettings, RendererSettings, SceneAssets};

pub fn renderer_settings(config: &Config) -> RendererSettings {
    RendererSettings {
        shadow_map_resolution: config.render.shadow_map_resolution,
        post: PostSettings {
            cutoff_threshold: config.render.cutoff_threshold,
            blur_radius: config.render.blur_radius,
            distortion_strength: config.render.distortion_strength,
        },
        scene_clear_color: config.render.scene_clear_color,
    }
}

/// Model and cube-map paths resolved against the asset directory.
pub fn scene_assets(config: &Config) -> SceneAssets {
    let scene = &config.scene;
    SceneAssets {
        world: scene.resolve(&scene.world),
        water: scene.resolve(&scene.water),
        vehicle: scene.resolve(&scene.vehicle),
        sky_day: scene.resolve(&scene.skybox_day),
        sky_night: scene.resolve(&scene.skybox_night),
        cube_map: scene.cube_map_paths(),
    }
}

pub fn initial_camera(camera: &CameraConfig) -> OrbitCamera {
    OrbitCamera::new(camera.theta, camera.phi, camera.radius, camera.target_altitude)
}

pub fn drag_sensitivity(camera: &CameraConfig) -> DragSensitivity {
    DragSensitivity {
        rotate_radians_per_pixel: camera.rotate_degrees_per_pixel.to_radians(),
        zoom_per_pixel: camera.zoom_per_pixel,
        altitude_per_pixel: camera.altitude_per_pixel,
    }
}

/// Interaction state for a fresh run, sized to the configured window.
pub fn initial_state(config: &Config) -> OrchestratorState {
    OrchestratorState::new(
        initial_camera(&config.camera),
        drag_sensitivity(&config.camera),
        (config.window.width, config.window.height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_matches_renderer_defaults() {
        assert_eq!(renderer_settings(&Config::default()), RendererSettings::default());
    }

    #[test]
    fn test_default_sensitivity_matches_animation_defaults() {
        let sensitivity = drag_sensitivity(&Config::default().camera);
        let expected = DragSensitivity::default();
        assert!(
            (sensitivity.rotate_radians_per_pixel - expected.rotate_radians_per_pixel).abs() < 1e-7
        );
        assert_eq!(sensitivity.zoom_per_pixel, expected.zoom_per_pixel);
        assert_eq!(sensitivity.altitude_per_pixel, expected.altitude_per_pixel);
    }

    #[test]
    fn test_assets_resolve_against_asset_dir() {
        let mut config = Config::default();
        config.scene.asset_dir = PathBuf::from("/data/solstice");
        let assets = scene_assets(&config);
        assert_eq!(assets.world, PathBuf::from("/data/solstice/scenes/island2.obj"));
        assert_eq!(assets.cube_map[5], PathBuf::from("/data/solstice/cube5.png"));
    }

    #[test]
    fn test_initial_state_uses_window_size() {
        let mut config = Config::default();
        config.window.width = 1024;
        config.window.height = 512;
        let state = initial_state(&config);
        assert_eq!(state.viewport(), (1024, 512));
        assert_eq!(state.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_initial_camera_clamps_config_values() {
        let camera = CameraConfig {
            phi: 10.0,
            radius: -1.0,
            ..CameraConfig::default()
        };
        let camera = initial_camera(&camera);
        assert!(camera.phi <= solstice_animation::MAX_POLAR);
        assert!(camera.radius >= solstice_animation::MIN_RADIUS);
    }
}
