//! Host-independent input vocabulary.
//!
//! The window layer translates platform events into these types so the
//! interaction rules stay free of any windowing crate.

/// Pointer buttons that drive the orbit camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Rotates the camera.
    Primary,
    /// Zooms the camera.
    Middle,
    /// Raises or lowers the look-at target.
    Secondary,
}

/// Keys the demo reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    /// Printable character, lowercase where applicable.
    Character(char),
}

/// What the host should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// Terminate with the given process exit code.
    Exit(u8),
}
