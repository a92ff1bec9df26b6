//! The frame orchestrator: host events in, one frame per tick out.
//!
//! Event handlers only mutate [`OrchestratorState`]. [`FrameOrchestrator::on_tick`]
//! advances the clock, derives the frame transforms and runs the fixed pass
//! sequence on the attached backend.

use solstice_animation::{Control, FrameSnapshot, Key, OrchestratorState, PointerButton};
use solstice_render::{FrameBackend, FrameInputs, run_frame};

/// Map a tick's snapshot to what the render passes consume.
pub fn frame_inputs(snapshot: &FrameSnapshot) -> FrameInputs {
    FrameInputs {
        elapsed: snapshot.elapsed,
        view: snapshot.view,
        projection: snapshot.projection,
        camera_position: snapshot.camera_position,
        light_position: snapshot.light_position,
        light_view_projection: snapshot.light.view_projection(),
        shadow_matrix: snapshot.light.shadow_matrix(),
        day_alpha: snapshot.day_alpha,
    }
}

pub struct FrameOrchestrator<B> {
    state: OrchestratorState,
    backend: Option<B>,
    frames_rendered: u64,
}

impl<B: FrameBackend> FrameOrchestrator<B> {
    /// Create an orchestrator with no backend; ticks advance state only.
    pub fn new(state: OrchestratorState) -> Self {
        Self {
            state,
            backend: None,
            frames_rendered: 0,
        }
    }

    pub fn attach_backend(&mut self, mut backend: B) {
        let (width, height) = self.state.viewport();
        backend.resize(width, height);
        self.backend = Some(backend);
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Frames that ran the full pass sequence.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.state.on_resize(width, height);
        if let Some(backend) = &mut self.backend {
            backend.resize(width, height);
        }
    }

    pub fn on_key_down(&mut self, key: Key) -> Control {
        self.state.on_key_down(key)
    }

    pub fn on_pointer_down(&mut self, button: PointerButton, x: f64, y: f64) {
        self.state.on_pointer_down(button, x, y);
    }

    pub fn on_pointer_up(&mut self, button: PointerButton, x: f64, y: f64) {
        self.state.on_pointer_up(button, x, y);
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        self.state.on_pointer_move(x, y);
    }

    /// Advance to wall time `now` (seconds) and render one frame.
    ///
    /// Returns the tick's snapshot and whether a frame was rendered.
    pub fn on_tick(&mut self, now: f64) -> Result<(FrameSnapshot, bool), B::Error> {
        let snapshot = self.state.tick(now);
        let Some(backend) = &mut self.backend else {
            return Ok((snapshot, false));
        };

        let rendered = run_frame(backend, &frame_inputs(&snapshot))?;
        if rendered {
            self.frames_rendered += 1;
            if self.frames_rendered == 1 {
                tracing::info!("First frame presented");
            }
        }
        Ok((snapshot, rendered))
    }
}
