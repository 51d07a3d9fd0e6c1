//! Qrbar Hardware Library
//!
//! Hardware abstraction for the 320x820 bar touchscreen panel: HID panel
//! device, RGB565 framebuffer, touch rotation correction, and QR bitmap
//! generation.

pub mod error;
pub mod framebuffer;
pub mod panel;
pub mod protocol;
pub mod qr;
pub mod rotation;
pub mod touch;

pub use error::{Error, Result};
pub use framebuffer::Framebuffer;
pub use panel::{Input, PanelDevice, PanelPort};
pub use qr::QrBitmap;
pub use rotation::Rotation;
pub use touch::{BacklightControl, ButtonPad, TouchPoint, TouchSurface};

/// Native panel dimensions (unrotated).
pub const PANEL_WIDTH: u16 = 320;
pub const PANEL_HEIGHT: u16 = 820;

/// USB VID:PID for the panel device
pub const PANEL_VID: u16 = 0x1FC9;
pub const PANEL_PID: u16 = 0x82C1;
