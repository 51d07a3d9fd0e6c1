//! RGB565 framebuffer the panel is blitted from.

use crate::{Error, Result};

/// RGB565 framebuffer, row-major, native panel orientation.
#[derive(Clone)]
pub struct Framebuffer {
    data: Vec<u16>,
    width: u16,
    height: u16,
}

impl Framebuffer {
    /// Creates a framebuffer initialized to black.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            data: vec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Raw pixel data, row-major.
    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// Clears the framebuffer to a solid color.
    pub fn clear(&mut self, color: u16) {
        self.data.fill(color);
    }

    /// Sets a pixel, ignoring out-of-range coordinates.
    pub fn set_pixel(&mut self, x: u16, y: u16, color: u16) {
        if x < self.width && y < self.height {
            self.data[y as usize * self.width as usize + x as usize] = color;
        }
    }

    /// Gets a pixel, or `None` when out of range.
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x < self.width && y < self.height {
            Some(self.data[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Replaces the contents from an RGB565 slice of the same size.
    pub fn copy_from_rgb565(&mut self, data: &[u16]) -> Result<()> {
        if data.len() != self.data.len() {
            return Err(Error::FramebufferSize {
                expected: self.data.len(),
                actual: data.len(),
            });
        }
        self.data.copy_from_slice(data);
        Ok(())
    }
}

/// Converts RGB888 to RGB565.
#[inline]
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r >> 3) as u16;
    let g6 = (g >> 2) as u16;
    let b5 = (b >> 3) as u16;
    (r5 << 11) | (g6 << 5) | b5
}
