//! Spherical orbit camera driven by pointer drags.
//!
//! The eye sits on a sphere of radius `radius` around the world origin and
//! looks at `(0, target_altitude, 0)` with +Y up. Raising the target tilts
//! the view without moving the eye.

use glam::{Mat4, Vec3};
use std::f32::consts::PI;

/// Smallest polar angle. Keeps the eye off the +Y pole where `look_at` degenerates.
pub const MIN_POLAR: f32 = 0.01;
/// Largest polar angle.
pub const MAX_POLAR: f32 = PI - 0.01;
/// Smallest allowed orbit radius.
pub const MIN_RADIUS: f32 = 0.1;

/// Vertical field of view of the scene camera, in degrees.
pub const FOV_Y_DEGREES: f32 = 45.0;
/// Near clip plane of the scene camera.
pub const Z_NEAR: f32 = 0.1;
/// Far clip plane of the scene camera.
pub const Z_FAR: f32 = 1000.0;

/// Convert spherical coordinates (azimuth `theta`, polar `phi`, radius `r`) to
/// a Y-up cartesian offset.
pub fn spherical_to_cartesian(theta: f32, phi: f32, r: f32) -> Vec3 {
    Vec3::new(
        r * theta.sin() * phi.sin(),
        r * phi.cos(),
        r * theta.cos() * phi.sin(),
    )
}

/// How far each drag moves the camera per pixel of pointer travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSensitivity {
    pub rotate_radians_per_pixel: f32,
    pub zoom_per_pixel: f32,
    pub altitude_per_pixel: f32,
}

impl Default for DragSensitivity {
    fn default() -> Self {
        Self {
            rotate_radians_per_pixel: 0.3_f32.to_radians(),
            zoom_per_pixel: 0.3,
            altitude_per_pixel: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    /// Azimuth around +Y, unbounded.
    pub theta: f32,
    /// Polar angle from +Y, kept in `[MIN_POLAR, MAX_POLAR]`.
    pub phi: f32,
    /// Distance from the origin, at least `MIN_RADIUS`.
    pub radius: f32,
    /// Height of the look-at target above the origin.
    pub target_altitude: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(PI / 6.0, PI / 4.0, 30.0, 5.2)
    }
}

impl OrbitCamera {
    /// Create a camera, clamping `phi` and `radius` into their valid ranges.
    pub fn new(theta: f32, phi: f32, radius: f32, target_altitude: f32) -> Self {
        Self {
            theta,
            phi: phi.clamp(MIN_POLAR, MAX_POLAR),
            radius: radius.max(MIN_RADIUS),
            target_altitude,
        }
    }

    pub fn target(&self) -> Vec3 {
        Vec3::new(0.0, self.target_altitude, 0.0)
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        spherical_to_cartesian(self.theta, self.phi, self.radius)
    }

    /// Right-handed view matrix looking from the eye to the target.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target(), Vec3::Y)
    }

    /// Perspective projection for the given viewport aspect ratio.
    ///
    /// A degenerate aspect (zero-height viewport) is treated as square.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR)
    }

    /// Primary-button drag: horizontal travel spins the azimuth, vertical
    /// travel tilts the polar angle (dragging down raises the eye).
    pub fn rotate(&mut self, dx: f32, dy: f32, sensitivity: &DragSensitivity) {
        self.theta += dx * sensitivity.rotate_radians_per_pixel;
        self.phi = (self.phi - dy * sensitivity.rotate_radians_per_pixel)
            .clamp(MIN_POLAR, MAX_POLAR);
    }

    /// Middle-button drag: dragging down moves the eye closer.
    pub fn zoom(&mut self, dy: f32, sensitivity: &DragSensitivity) {
        self.radius = (self.radius - dy * sensitivity.zoom_per_pixel).max(MIN_RADIUS);
    }

    /// Secondary-button drag: dragging down raises the target.
    pub fn raise(&mut self, dy: f32, sensitivity: &DragSensitivity) {
        self.target_altitude += dy * sensitivity.altitude_per_pixel;
    }
}
