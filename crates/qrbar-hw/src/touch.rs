//! Touch and button input seams.

use crate::Result;

/// One active touch point in raw panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: i32,
    pub y: i32,
}

/// Source of active touch points, polled once per loop tick.
pub trait TouchSurface {
    /// Returns the currently active touch points, empty when the surface is
    /// not being touched.
    fn poll_touches(&mut self) -> Result<Vec<TouchPoint>>;
}

/// The panel's two discrete buttons.
pub trait ButtonPad {
    fn button_up(&mut self) -> Result<bool>;
    fn button_down(&mut self) -> Result<bool>;
}

/// Backlight on/off control.
pub trait BacklightControl {
    fn set_backlight(&mut self, on: bool) -> Result<()>;
}
