//! Mutable interaction state owned by the frame orchestrator.
//!
//! All per-tick and per-event mutation goes through the `on_*` handlers and
//! [`OrchestratorState::tick`]; the renderer only ever sees the immutable
//! [`FrameSnapshot`] produced by a tick.

use crate::camera::{DragSensitivity, OrbitCamera};
use crate::clock::AnimationClock;
use crate::input::{Control, Key, PointerButton};
use crate::sun::{LightTransforms, day_sky_alpha, orbit_angle, sun_position};
use glam::{Mat4, Vec3};

/// Which pointer buttons are held and where the pointer was last seen.
#[derive(Debug, Clone, Copy, Default)]
struct PointerTracker {
    primary: bool,
    middle: bool,
    secondary: bool,
    last: (f64, f64),
}

impl PointerTracker {
    fn set(&mut self, button: PointerButton, held: bool) {
        match button {
            PointerButton::Primary => self.primary = held,
            PointerButton::Middle => self.middle = held,
            PointerButton::Secondary => self.secondary = held,
        }
    }

    fn any_held(&self) -> bool {
        self.primary || self.middle || self.secondary
    }
}

/// Everything the frame pipeline needs from one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    /// Elapsed animation seconds.
    pub elapsed: f32,
    /// Sun orbit angle in radians, `[0, 2π)`.
    pub sun_angle: f32,
    pub light_position: Vec3,
    pub light: LightTransforms,
    pub camera_position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    /// Opacity of the day skybox.
    pub day_alpha: f32,
}

/// Clock, camera, light and pointer state for the running demo.
#[derive(Debug, Clone)]
pub struct OrchestratorState {
    clock: AnimationClock,
    camera: OrbitCamera,
    sensitivity: DragSensitivity,
    light_position: Vec3,
    pointer: PointerTracker,
    viewport: (u32, u32),
}

impl OrchestratorState {
    pub fn new(camera: OrbitCamera, sensitivity: DragSensitivity, viewport: (u32, u32)) -> Self {
        Self {
            clock: AnimationClock::new(),
            camera,
            sensitivity,
            light_position: sun_position(0.0),
            pointer: PointerTracker::default(),
            viewport,
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn light_position(&self) -> Vec3 {
        self.light_position
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Width over height of the current viewport.
    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.viewport;
        if height == 0 {
            return 1.0;
        }
        width as f32 / height as f32
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        tracing::debug!(width, height, "Viewport resized");
    }

    pub fn on_key_down(&mut self, key: Key) -> Control {
        match key {
            Key::Escape => {
                tracing::info!("Exit requested");
                return Control::Exit(0);
            }
            Key::Space => {
                let paused = self.clock.toggle_pause();
                tracing::info!(paused, elapsed = self.clock.elapsed(), "Animation pause toggled");
            }
            Key::ArrowLeft | Key::ArrowRight | Key::ArrowUp | Key::ArrowDown => {
                tracing::debug!(?key, "Arrow key pressed");
            }
            Key::Character(c) => {
                tracing::trace!(key = %c, "Unbound key");
            }
        }
        Control::Continue
    }

    pub fn on_pointer_down(&mut self, button: PointerButton, x: f64, y: f64) {
        self.pointer.set(button, true);
        self.pointer.last = (x, y);
    }

    pub fn on_pointer_up(&mut self, button: PointerButton, x: f64, y: f64) {
        self.pointer.set(button, false);
        self.pointer.last = (x, y);
    }

    /// Apply drag deltas for every held button.
    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        let (last_x, last_y) = self.pointer.last;
        self.pointer.last = (x, y);
        if !self.pointer.any_held() {
            return;
        }

        let dx = (x - last_x) as f32;
        let dy = (y - last_y) as f32;
        if self.pointer.primary {
            self.camera.rotate(dx, dy, &self.sensitivity);
        }
        if self.pointer.middle {
            self.camera.zoom(dy, &self.sensitivity);
        }
        if self.pointer.secondary {
            self.camera.raise(dy, &self.sensitivity);
        }
    }

    /// Advance the clock, move the sun and derive this tick's transforms.
    pub fn tick(&mut self, wall_seconds: f64) -> FrameSnapshot {
        let elapsed = self.clock.tick(wall_seconds) as f32;
        self.light_position = sun_position(elapsed);
        FrameSnapshot {
            elapsed,
            sun_angle: orbit_angle(elapsed),
            light_position: self.light_position,
            light: LightTransforms::looking_at_origin(self.light_position),
            camera_position: self.camera.position(),
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(self.aspect_ratio()),
            day_alpha: day_sky_alpha(elapsed),
        }
    }
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::new(OrbitCamera::default(), DragSensitivity::default(), (800, 512))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{MAX_POLAR, MIN_POLAR, MIN_RADIUS};
    use crate::sun::SUN_REFERENCE_POSITION;

    #[test]
    fn test_escape_exits_with_zero() {
        let mut state = OrchestratorState::default();
        assert_eq!(state.on_key_down(Key::Escape), Control::Exit(0));
    }

    #[test]
    fn test_space_toggles_pause() {
        let mut state = OrchestratorState::default();
        assert_eq!(state.on_key_down(Key::Space), Control::Continue);
        assert!(state.clock().is_paused());
        state.on_key_down(Key::Space);
        assert!(!state.clock().is_paused());
    }

    #[test]
    fn test_arrows_and_letters_change_nothing() {
        let mut state = OrchestratorState::default();
        let before = *state.camera();
        for key in [Key::ArrowLeft, Key::ArrowUp, Key::Character('w')] {
            assert_eq!(state.on_key_down(key), Control::Continue);
        }
        assert_eq!(*state.camera(), before);
        assert!(!state.clock().is_paused());
    }

    #[test]
    fn test_primary_drag_rotates() {
        let mut state = OrchestratorState::default();
        let before = *state.camera();
        state.on_pointer_down(PointerButton::Primary, 100.0, 100.0);
        state.on_pointer_move(110.0, 95.0);
        let after = *state.camera();
        assert!(after.theta > before.theta);
        assert!(after.phi > before.phi);
        assert_eq!(after.radius, before.radius);
        assert_eq!(after.target_altitude, before.target_altitude);
    }

    #[test]
    fn test_move_without_button_is_ignored() {
        let mut state = OrchestratorState::default();
        let before = *state.camera();
        state.on_pointer_move(500.0, 500.0);
        state.on_pointer_move(0.0, 0.0);
        assert_eq!(*state.camera(), before);
    }

    #[test]
    fn test_press_resets_previous_position() {
        let mut state = OrchestratorState::default();
        state.on_pointer_move(1000.0, 1000.0);
        state.on_pointer_down(PointerButton::Middle, 10.0, 10.0);
        let before = state.camera().radius;
        state.on_pointer_move(10.0, 20.0);
        assert!((state.camera().radius - (before - 3.0)).abs() < 1e-4);
    }

    #[test]
    fn test_release_stops_drag() {
        let mut state = OrchestratorState::default();
        state.on_pointer_down(PointerButton::Secondary, 0.0, 0.0);
        state.on_pointer_move(0.0, 10.0);
        state.on_pointer_up(PointerButton::Secondary, 0.0, 10.0);
        let altitude = state.camera().target_altitude;
        state.on_pointer_move(0.0, 300.0);
        assert_eq!(state.camera().target_altitude, altitude);
        assert!((altitude - 6.2).abs() < 1e-5);
    }

    #[test]
    fn test_polar_clamp_under_cumulative_drag() {
        let mut state = OrchestratorState::default();
        state.on_pointer_down(PointerButton::Primary, 0.0, 0.0);
        for step in 1..=50 {
            state.on_pointer_move(0.0, step as f64 * 400.0);
            let phi = state.camera().phi;
            assert!((MIN_POLAR..=MAX_POLAR).contains(&phi));
        }
        assert_eq!(state.camera().phi, MIN_POLAR);
        state.on_pointer_move(0.0, 1.0e6);
        assert_eq!(state.camera().phi, MIN_POLAR);
    }

    #[test]
    fn test_radius_floor_under_cumulative_drag() {
        let mut state = OrchestratorState::default();
        state.on_pointer_down(PointerButton::Middle, 0.0, 0.0);
        for step in 1..=50 {
            state.on_pointer_move(0.0, step as f64 * 100.0);
            assert!(state.camera().radius >= MIN_RADIUS);
        }
        assert_eq!(state.camera().radius, MIN_RADIUS);
    }

    #[test]
    fn test_tick_moves_light() {
        let mut state = OrchestratorState::default();
        let first = state.tick(100.0);
        assert_eq!(first.elapsed, 0.0);
        assert!((first.light_position - SUN_REFERENCE_POSITION).length() < 1e-4);
        assert_eq!(first.day_alpha, 1.0);

        let later = state.tick(105.0);
        assert_eq!(later.elapsed, 5.0);
        assert_eq!(later.light_position, state.light_position());
        assert!(later.light_position.z > 400.0);
    }

    #[test]
    fn test_aspect_tracks_resize() {
        let mut state = OrchestratorState::default();
        state.on_resize(1000, 500);
        assert_eq!(state.aspect_ratio(), 2.0);
        state.on_resize(640, 0);
        assert_eq!(state.aspect_ratio(), 1.0);
    }

    #[test]
    fn test_pause_scenario() {
        let mut state = OrchestratorState::default();
        let mut clock_values = Vec::new();

        clock_values.push(state.tick(0.0).elapsed);
        let paused_at = state.tick(5.0);
        clock_values.push(paused_at.elapsed);
        state.on_key_down(Key::Space);

        let mut last_paused = paused_at;
        for _ in 0..3 {
            last_paused = state.tick(5.0);
            clock_values.push(last_paused.elapsed);
        }

        state.on_key_down(Key::Space);
        clock_values.push(state.tick(7.0).elapsed);

        assert_eq!(clock_values, vec![0.0, 5.0, 5.0, 5.0, 5.0, 7.0]);
        assert_eq!(paused_at.sun_angle, last_paused.sun_angle);
        assert_eq!(paused_at.light_position, last_paused.light_position);
    }
}
