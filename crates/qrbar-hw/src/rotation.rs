//! Display rotation and touch coordinate correction.
//!
//! The panel is mounted rotated; the touch controller reports coordinates in
//! the native (unrotated) frame. `correct` maps a raw touch point into the
//! logical frame the scene graph is laid out in.

use crate::{Error, Result};
use std::str::FromStr;

/// Display rotation, fixed for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// No rotation, logical frame equals the native frame.
    #[default]
    Deg0,
    /// Rotated 90 degrees (the bar display's usual mounting).
    Deg90,
    /// Rotated 180 degrees.
    Deg180,
    /// Rotated 270 degrees.
    Deg270,
}

impl Rotation {
    /// Returns the rotation for a degree value, if it is one of the four
    /// supported steps.
    pub fn from_degrees(deg: u16) -> Option<Self> {
        match deg {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Returns true if this rotation swaps the display axes.
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Logical display dimensions for a native `(width, height)` panel.
    pub fn dimensions(&self, width: u16, height: u16) -> (u16, u16) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Maps a raw touch point into the logical (unrotated) coordinate frame.
    ///
    /// `width` and `height` are the logical dimensions. No bounds clamping is
    /// performed; out-of-range input yields out-of-range output and filtering
    /// is the caller's job.
    pub fn correct(&self, x: i32, y: i32, width: i32, height: i32) -> (i32, i32) {
        match self {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (y, height - x - 1),
            Rotation::Deg180 => (width - x - 1, height - y - 1),
            Rotation::Deg270 => (width - y - 1, x),
        }
    }

    /// Inverse of [`correct`](Self::correct): maps a logical point back to
    /// the raw touch frame.
    pub fn invert(&self, x: i32, y: i32, width: i32, height: i32) -> (i32, i32) {
        match self {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (height - y - 1, x),
            Rotation::Deg180 => (width - x - 1, height - y - 1),
            Rotation::Deg270 => (y, width - x - 1),
        }
    }
}

impl FromStr for Rotation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .trim_end_matches("deg")
            .trim()
            .parse::<u16>()
            .ok()
            .and_then(Rotation::from_degrees)
            .ok_or_else(|| Error::InvalidRotation(s.to_string()))
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let deg = match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        };
        write!(f, "{}", deg)
    }
}
