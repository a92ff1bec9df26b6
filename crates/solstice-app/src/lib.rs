//! Solstice host application.
//!
//! Wires the configuration, the animation state and the renderer together
//! behind a winit event loop.

pub mod orchestrator;
pub mod setup;
pub mod window;

pub use orchestrator::{FrameOrchestrator, frame_inputs};
pub use window::{App, RunError, run};
