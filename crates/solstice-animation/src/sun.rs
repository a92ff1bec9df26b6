//! Sun orbit, day/night blend and light-space transforms.
//!
//! The sun starts at [`SUN_REFERENCE_POSITION`] and rotates about the world X
//! axis once every [`DAY_PERIOD_SECONDS`]. The shadow pass renders depth from
//! the sun toward the origin; the scene pass maps world positions into the
//! shadow map with [`LightTransforms::shadow_matrix`].

use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::TAU;

/// Length of one full day/night cycle.
pub const DAY_PERIOD_SECONDS: f32 = 20.0;

/// Sun position at elapsed time zero.
pub const SUN_REFERENCE_POSITION: Vec3 = Vec3::new(30.1, 450.0, 0.1);

/// Light frustum vertical field of view, in degrees.
pub const LIGHT_FOV_Y_DEGREES: f32 = 25.0;
pub const LIGHT_Z_NEAR: f32 = 5.0;
pub const LIGHT_Z_FAR: f32 = 500.0;

/// Orbit angle in `[0, 2π)` for an elapsed time.
pub fn orbit_angle(elapsed: f32) -> f32 {
    (TAU * elapsed / DAY_PERIOD_SECONDS).rem_euclid(TAU)
}

/// World-space sun position for an elapsed time.
pub fn sun_position(elapsed: f32) -> Vec3 {
    Mat4::from_rotation_x(orbit_angle(elapsed)).transform_point3(SUN_REFERENCE_POSITION)
}

/// Opacity of the day skybox drawn over the night skybox.
///
/// Fully opaque at noon (t = 0), fading to zero by a quarter period and
/// staying transparent through the night half of the cycle.
pub fn day_sky_alpha(elapsed: f32) -> f32 {
    (TAU * elapsed / DAY_PERIOD_SECONDS).cos().max(0.0)
}

/// Maps light clip space to shadow-map texture space: x,y from `[-1, 1]` to
/// `[0, 1]` with V pointing down, depth left as is.
pub fn shadow_bias_matrix() -> Mat4 {
    Mat4::from_cols(
        Vec4::new(0.5, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -0.5, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(0.5, 0.5, 0.0, 1.0),
    )
}

/// View and projection used to render and sample the shadow map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTransforms {
    pub view: Mat4,
    pub projection: Mat4,
}

impl LightTransforms {
    /// Light looking from `position` at the world origin with +Y up.
    pub fn looking_at_origin(position: Vec3) -> Self {
        Self {
            view: Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(
                LIGHT_FOV_Y_DEGREES.to_radians(),
                1.0,
                LIGHT_Z_NEAR,
                LIGHT_Z_FAR,
            ),
        }
    }

    /// Transform used by the depth-only shadow pass.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// World space to shadow-map texture coordinates plus light depth.
    pub fn shadow_matrix(&self) -> Mat4 {
        shadow_bias_matrix() * self.view_projection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_near(a: Vec3, b: Vec3, tolerance: f32) {
        assert!(
            (a - b).length() < tolerance,
            "expected {b:?}, got {a:?} (tolerance {tolerance})"
        );
    }

    #[test]
    fn test_sun_starts_at_reference() {
        assert_vec3_near(sun_position(0.0), SUN_REFERENCE_POSITION, 1e-4);
    }

    #[test]
    fn test_sun_orbit_is_periodic() {
        assert_vec3_near(sun_position(DAY_PERIOD_SECONDS), SUN_REFERENCE_POSITION, 1e-2);
        assert_vec3_near(sun_position(3.0), sun_position(3.0 + DAY_PERIOD_SECONDS), 1e-2);
    }

    #[test]
    fn test_sun_half_period_is_antipodal_in_yz() {
        let half = sun_position(DAY_PERIOD_SECONDS / 2.0);
        assert!((half.x - SUN_REFERENCE_POSITION.x).abs() < 1e-3);
        assert!((half.y + SUN_REFERENCE_POSITION.y).abs() < 1e-2);
        assert!((half.z + SUN_REFERENCE_POSITION.z).abs() < 1e-2);
    }

    #[test]
    fn test_sun_keeps_distance_from_x_axis() {
        let reference = SUN_REFERENCE_POSITION.y.hypot(SUN_REFERENCE_POSITION.z);
        for step in 0..40 {
            let p = sun_position(step as f32 * 0.5);
            assert!((p.y.hypot(p.z) - reference).abs() < 1e-2);
        }
    }

    #[test]
    fn test_orbit_angle_range() {
        for step in -40..80 {
            let angle = orbit_angle(step as f32 * 0.7);
            assert!((0.0..TAU).contains(&angle), "angle {angle} out of range");
        }
        assert!((orbit_angle(5.0) - TAU / 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_day_alpha_curve() {
        assert!((day_sky_alpha(0.0) - 1.0).abs() < 1e-6);
        assert!(day_sky_alpha(5.0).abs() < 1e-6);
        assert_eq!(day_sky_alpha(10.0), 0.0);
        assert!(day_sky_alpha(15.0).abs() < 1e-6);
        assert!((day_sky_alpha(20.0) - 1.0).abs() < 1e-5);
        for step in 0..200 {
            let alpha = day_sky_alpha(step as f32 * 0.13);
            assert!((0.0..=1.0).contains(&alpha));
        }
    }

    #[test]
    fn test_bias_matrix_maps_ndc_corners() {
        let bias = shadow_bias_matrix();
        assert_vec3_near(
            bias.transform_point3(Vec3::new(-1.0, 1.0, 0.25)),
            Vec3::new(0.0, 0.0, 0.25),
            1e-6,
        );
        assert_vec3_near(
            bias.transform_point3(Vec3::new(1.0, -1.0, 0.75)),
            Vec3::new(1.0, 1.0, 0.75),
            1e-6,
        );
    }

    #[test]
    fn test_origin_lands_in_shadow_map_center() {
        let light = LightTransforms::looking_at_origin(SUN_REFERENCE_POSITION);
        let origin = light.shadow_matrix().project_point3(Vec3::ZERO);
        assert!((origin.x - 0.5).abs() < 1e-4);
        assert!((origin.y - 0.5).abs() < 1e-4);
        assert!(origin.z > 0.0 && origin.z < 1.0);
    }

    #[test]
    fn test_closer_points_have_smaller_light_depth() {
        let light = LightTransforms::looking_at_origin(SUN_REFERENCE_POSITION);
        let toward_sun = SUN_REFERENCE_POSITION.normalize() * 100.0;
        let near = light.shadow_matrix().project_point3(toward_sun).z;
        let far = light.shadow_matrix().project_point3(Vec3::ZERO).z;
        assert!(near < far);
    }
}
