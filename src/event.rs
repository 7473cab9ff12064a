//! Host events
//!
//! The host runtime owns the real event loop and hands the framework at most
//! one event per iteration: a keyboard/mouse event for the character grid,
//! or a bare timer pulse when nothing happened. The scheduler treats the
//! event as opaque except for routing a clone to tasks that asked to wait
//! for one.
//!
//! Coordinates are character-cell positions on the fixed grid, not pixels.

/// One event delivered by the host, or a bare tick.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// No input this iteration; just a timer pulse.
    Tick,
    /// Named key pressed (arrows, function keys, modified keys).
    Key { key: String, modifiers: Modifiers },
    /// Printable character typed.
    Char(char),
    /// Mouse button pressed at a grid cell.
    MouseDown { x: u16, y: u16, button: u8 },
    /// Mouse button released.
    MouseUp { x: u16, y: u16, button: u8 },
    /// Mouse moved while a button is held.
    MouseDrag { x: u16, y: u16, button: u8 },
    /// Scroll wheel; `delta` is negative for up.
    Scroll { x: u16, y: u16, delta: i8 },
    /// Terminal grid resized.
    Resize { cols: u16, rows: u16 },
}

/// Modifier keys held during a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}
