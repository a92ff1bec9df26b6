//! Window creation and event handling via winit.
//!
//! [`App`] implements winit's [`ApplicationHandler`]: it creates the window
//! and renderer on resume, translates platform events into the host-neutral
//! input vocabulary and keeps a redraw requested so the orchestrator ticks
//! once per displayed frame.

use std::sync::Arc;
use std::time::Instant;

use solstice_animation::{Control, Key, PointerButton};
use solstice_config::Config;
use solstice_render::{
    FrameError, InitError, Renderer, SurfaceError, init_render_context_blocking,
};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{self, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::orchestrator::FrameOrchestrator;
use crate::setup;

/// Errors that end the event loop itself.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// Translate a winit key to the keys the demo handles.
pub fn map_key(key: &keyboard::Key) -> Option<Key> {
    match key {
        keyboard::Key::Named(NamedKey::Escape) => Some(Key::Escape),
        keyboard::Key::Named(NamedKey::Space) => Some(Key::Space),
        keyboard::Key::Named(NamedKey::ArrowLeft) => Some(Key::ArrowLeft),
        keyboard::Key::Named(NamedKey::ArrowRight) => Some(Key::ArrowRight),
        keyboard::Key::Named(NamedKey::ArrowUp) => Some(Key::ArrowUp),
        keyboard::Key::Named(NamedKey::ArrowDown) => Some(Key::ArrowDown),
        keyboard::Key::Character(text) if text.as_str() == " " => Some(Key::Space),
        keyboard::Key::Character(text) => text
            .chars()
            .next()
            .map(|c| Key::Character(c.to_ascii_lowercase())),
        _ => None,
    }
}

pub fn map_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Application state: the window, the orchestrator and the exit status.
pub struct App {
    config: Config,
    window: Option<Arc<Window>>,
    orchestrator: FrameOrchestrator<Renderer>,
    start_time: Instant,
    cursor: (f64, f64),
    exit_code: u8,
}

impl App {
    pub fn new(config: Config) -> Self {
        let orchestrator = FrameOrchestrator::new(setup::initial_state(&config));
        Self {
            config,
            window: None,
            orchestrator,
            start_time: Instant::now(),
            cursor: (0.0, 0.0),
            exit_code: 0,
        }
    }

    /// Process exit code once the loop has ended.
    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop, code: u8) {
        self.exit_code = code;
        event_loop.exit();
    }

    fn create_renderer(&self, window: Arc<Window>) -> Result<Renderer, InitError> {
        let ctx = init_render_context_blocking(window, self.config.window.vsync)?;
        Renderer::new(
            ctx,
            &setup::renderer_settings(&self.config),
            &setup::scene_assets(&self.config),
        )
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.start_time.elapsed().as_secs_f64();
        match self.orchestrator.on_tick(now) {
            Ok(_) => {}
            Err(FrameError::Surface(SurfaceError::OutOfMemory)) => {
                error!("GPU out of memory, shutting down");
                self.exit(event_loop, 1);
                return;
            }
            Err(e) => warn!("Frame failed: {e}"),
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                self.exit(event_loop, 1);
                return;
            }
        };

        match self.create_renderer(window.clone()) {
            Ok(renderer) => {
                let size = window.inner_size();
                self.orchestrator.on_resize(size.width, size.height);
                self.orchestrator.attach_backend(renderer);
                info!("Initialized {}x{} window", size.width, size.height);
            }
            Err(e) => {
                error!("Initialization failed: {e}");
                self.exit(event_loop, 1);
                return;
            }
        }

        self.start_time = Instant::now();
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.exit(event_loop, 0);
            }
            WindowEvent::Resized(size) => {
                self.orchestrator.on_resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let Some(key) = map_key(&event.logical_key)
                    && let Control::Exit(code) = self.orchestrator.on_key_down(key)
                {
                    self.exit(event_loop, code);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = map_button(button) else {
                    return;
                };
                let (x, y) = self.cursor;
                match state {
                    ElementState::Pressed => self.orchestrator.on_pointer_down(button, x, y),
                    ElementState::Released => self.orchestrator.on_pointer_up(button, x, y),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
                self.orchestrator.on_pointer_move(position.x, position.y);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Run the demo until the window closes. Returns the process exit code.
pub fn run(config: Config) -> Result<u8, RunError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(app.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_map() {
        assert_eq!(
            map_key(&keyboard::Key::Named(NamedKey::Escape)),
            Some(Key::Escape)
        );
        assert_eq!(
            map_key(&keyboard::Key::Named(NamedKey::Space)),
            Some(Key::Space)
        );
        assert_eq!(
            map_key(&keyboard::Key::Named(NamedKey::ArrowUp)),
            Some(Key::ArrowUp)
        );
        assert_eq!(map_key(&keyboard::Key::Named(NamedKey::Enter)), None);
    }

    #[test]
    fn test_character_keys_are_lowercased() {
        assert_eq!(
            map_key(&keyboard::Key::Character("Q".into())),
            Some(Key::Character('q'))
        );
        assert_eq!(
            map_key(&keyboard::Key::Character(" ".into())),
            Some(Key::Space)
        );
    }

    #[test]
    fn test_mouse_buttons_map() {
        assert_eq!(map_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(map_button(MouseButton::Middle), Some(PointerButton::Middle));
        assert_eq!(map_button(MouseButton::Right), Some(PointerButton::Secondary));
        assert_eq!(map_button(MouseButton::Back), None);
    }

    #[test]
    fn test_window_attributes_use_config_size() {
        let attrs = window_attributes_from_config(&Config::default());
        assert_eq!(attrs.title, "Solstice");
        assert!(attrs.inner_size.is_some());
    }
}
