//! QR code module bitmaps.
//!
//! Encoding is delegated to `qrcodegen`; this module only exposes the module
//! matrix the rasterizer scales onto the display.

use crate::{Error, Result};
use qrcodegen::{QrCode, QrCodeEcc};

/// A generated QR code as a square matrix of dark/light modules.
#[derive(Debug, Clone)]
pub struct QrBitmap {
    size: u32,
    modules: Vec<bool>,
}

impl QrBitmap {
    /// Encodes an arbitrary string payload at medium error correction.
    pub fn encode(payload: &str) -> Result<Self> {
        let qr = QrCode::encode_text(payload, QrCodeEcc::Medium)
            .map_err(|_| Error::QrPayload(payload.len()))?;
        let size = qr.size() as u32;
        let mut modules = Vec::with_capacity((size * size) as usize);
        for y in 0..qr.size() {
            for x in 0..qr.size() {
                modules.push(qr.get_module(x, y));
            }
        }
        Ok(Self { size, modules })
    }

    /// Side length in modules.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns true if the module at `(x, y)` is dark. Out-of-range
    /// coordinates are light.
    pub fn module(&self, x: u32, y: u32) -> bool {
        if x < self.size && y < self.size {
            self.modules[(y * self.size + x) as usize]
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_url() {
        let qr = QrBitmap::encode("http://192.168.1.7:80/").unwrap();
        // Smallest QR version is 21 modules; anything sane is larger or equal.
        assert!(qr.size() >= 21);
        // Finder pattern corner module is always dark.
        assert!(qr.module(0, 0));
        // Out of range is light, not a panic.
        assert!(!qr.module(qr.size(), 0));
    }

    #[test]
    fn test_oversized_payload() {
        let payload = "x".repeat(8000);
        assert!(QrBitmap::encode(&payload).is_err());
    }
}
