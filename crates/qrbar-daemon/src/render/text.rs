//! Caption text rendering using fontdue.

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use tiny_skia::Pixmap;

/// Text renderer over a TTF font loaded at startup.
pub struct TextRenderer {
    font: Font,
}

impl TextRenderer {
    /// Loads a font from a file path.
    pub fn load(path: &str) -> Result<Self> {
        let data = std::fs::read(path).with_context(|| format!("reading font {}", path))?;
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| anyhow!("parsing font {}: {}", path, e))?;
        Ok(Self { font })
    }

    /// Draws text onto the pixmap with `(x, y)` as the top-left corner,
    /// alpha-blending glyph coverage over whatever is already there.
    pub fn draw_text(&self, pixmap: &mut Pixmap, x: i32, y: i32, text: &str, size: f32, color: u32) {
        let r = ((color >> 16) & 0xFF) as u8;
        let g = ((color >> 8) & 0xFF) as u8;
        let b = (color & 0xFF) as u8;

        let width = pixmap.width();
        let height = pixmap.height();
        let mut cursor_x = x;

        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, size);

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let px = cursor_x + metrics.xmin + gx as i32;
                    let py = y + (size as i32 - metrics.ymin - metrics.height as i32) + gy as i32;
                    if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                        continue;
                    }

                    let idx = (py as u32 * width + px as u32) as usize * 4;
                    let data = pixmap.data_mut();
                    let alpha = coverage as f32 / 255.0;
                    let inv = 1.0 - alpha;
                    data[idx] = (r as f32 * alpha + data[idx] as f32 * inv) as u8;
                    data[idx + 1] = (g as f32 * alpha + data[idx + 1] as f32 * inv) as u8;
                    data[idx + 2] = (b as f32 * alpha + data[idx + 2] as f32 * inv) as u8;
                    data[idx + 3] = 255;
                }
            }

            cursor_x += metrics.advance_width as i32;
        }
    }

    /// Width of `text` in pixels at the given size.
    pub fn text_width(&self, text: &str, size: f32) -> i32 {
        text.chars()
            .map(|ch| self.font.rasterize(ch, size).0.advance_width as i32)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    #[test]
    fn test_draw_with_system_font() {
        // Only meaningful on hosts that ship the default font.
        let path = config::Config::default().font;
        if !std::path::Path::new(&path).exists() {
            return;
        }
        let renderer = TextRenderer::load(&path).unwrap();
        assert!(renderer.text_width("SSID: workshop", 24.0) > 0);

        let mut pixmap = Pixmap::new(200, 40).unwrap();
        renderer.draw_text(&mut pixmap, 0, 0, "IP: 10.0.0.2", 24.0, 0xFFFFFF);
        assert!(pixmap.data().iter().any(|&b| b != 0));
    }

    #[test]
    fn test_missing_font_is_an_error() {
        assert!(TextRenderer::load("/nonexistent/font.ttf").is_err());
    }
}
