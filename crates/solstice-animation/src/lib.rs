//! Animation and interaction state: the pausable clock, the orbiting sun and
//! the pointer-driven orbit camera.
//!
//! Nothing in this crate touches the GPU, so every rule that drives the frame
//! pipeline (clock pausing, clamping, orbit math) is unit-testable.

pub mod camera;
pub mod clock;
pub mod input;
pub mod state;
pub mod sun;

pub use camera::{DragSensitivity, MAX_POLAR, MIN_POLAR, MIN_RADIUS, OrbitCamera};
pub use clock::AnimationClock;
pub use input::{Control, Key, PointerButton};
pub use state::{FrameSnapshot, OrchestratorState};
pub use sun::{
    DAY_PERIOD_SECONDS, LightTransforms, SUN_REFERENCE_POSITION, day_sky_alpha, orbit_angle,
    shadow_bias_matrix, sun_position,
};
