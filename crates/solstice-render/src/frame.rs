//! Per-frame pass sequencing.
//!
//! [`FRAME_SEQUENCE`] is the single source of pass order. [`run_frame`] walks
//! it and hands each entry to a [`FrameBackend`]; the GPU renderer is one
//! backend, tests use a recording one.

use glam::{Mat4, Vec3};

use crate::gpu::SurfaceError;

/// One step of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FramePass {
    Shadow,
    Scene,
    Cutoff,
    HorizontalBlur,
    VerticalBlur,
    Composite,
    Present,
}

/// Passes in execution order.
pub const FRAME_SEQUENCE: [FramePass; 7] = [
    FramePass::Shadow,
    FramePass::Scene,
    FramePass::Cutoff,
    FramePass::HorizontalBlur,
    FramePass::VerticalBlur,
    FramePass::Composite,
    FramePass::Present,
];

/// Everything a frame needs from the animation state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInputs {
    /// Animation clock in seconds.
    pub elapsed: f32,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub light_position: Vec3,
    pub light_view_projection: Mat4,
    /// Bias · light projection · light view.
    pub shadow_matrix: Mat4,
    /// Opacity of the day skybox.
    pub day_alpha: f32,
}

impl Default for FrameInputs {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            light_position: Vec3::ZERO,
            light_view_projection: Mat4::IDENTITY,
            shadow_matrix: Mat4::IDENTITY,
            day_alpha: 1.0,
        }
    }
}

/// Errors raised while executing a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// A pass ran without a frame in flight.
    #[error("pass {0:?} executed outside of a frame")]
    NotStarted(FramePass),

    /// A post pass is wired to a target the backend cannot draw into.
    #[error("pass {0:?} has no offscreen target")]
    MissingTarget(FramePass),
}

/// Executes the passes of a frame.
pub trait FrameBackend {
    type Error;

    /// Prepare a frame. `Ok(false)` skips it without running any pass.
    fn begin_frame(&mut self, inputs: &FrameInputs) -> Result<bool, Self::Error>;

    /// Run one pass.
    fn execute(&mut self, pass: FramePass, inputs: &FrameInputs) -> Result<(), Self::Error>;

    /// The presentation surface changed size.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Run every pass of [`FRAME_SEQUENCE`] once, in order.
///
/// Returns `Ok(false)` if the backend skipped the frame.
pub fn run_frame<B: FrameBackend>(backend: &mut B, inputs: &FrameInputs) -> Result<bool, B::Error> {
    if !backend.begin_frame(inputs)? {
        return Ok(false);
    }
    for pass in FRAME_SEQUENCE {
        backend.execute(pass, inputs)?;
    }
    Ok(true)
}
