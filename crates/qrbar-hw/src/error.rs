//! Error types for the qrbar hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the hardware.
#[derive(Error, Debug)]
pub enum Error {
    /// Panel device not found or could not be opened.
    #[error("panel device not found (VID:PID 1FC9:82C1)")]
    PanelNotFound,

    /// USB HID communication error.
    #[error("USB HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// Input report could not be parsed.
    #[error("malformed input report ({0} bytes)")]
    MalformedReport(usize),

    /// Invalid rotation value.
    #[error("invalid rotation: {0}")]
    InvalidRotation(String),

    /// Framebuffer size mismatch.
    #[error("framebuffer size mismatch: expected {expected}, got {actual}")]
    FramebufferSize { expected: usize, actual: usize },

    /// QR payload could not be encoded.
    #[error("QR payload too long ({0} bytes)")]
    QrPayload(usize),
}
