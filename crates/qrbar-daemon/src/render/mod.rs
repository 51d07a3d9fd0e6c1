//! Scene rasterization.
//!
//! The scene graph is drawn into a pixmap in the logical (rotated) frame,
//! then converted into the panel's native RGB565 framebuffer with the session
//! rotation applied.

mod text;

pub use text::TextRenderer;

use qrbar_hw::framebuffer::{rgb888_to_rgb565, Framebuffer};
use qrbar_hw::Rotation;
use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};
use tracing::warn;

use crate::scene::{Content, NodeId, NodeKind, SceneGraph};

/// Quiet-zone width around a QR code, in modules.
pub const QUIET_MODULES: u32 = 2;

/// Rasterizes scene graphs. Text rendering degrades to nothing when the
/// configured font cannot be loaded.
pub struct Renderer {
    text: Option<TextRenderer>,
}

impl Renderer {
    pub fn new(font_path: &str) -> Self {
        let text = match TextRenderer::load(font_path) {
            Ok(renderer) => Some(renderer),
            Err(e) => {
                warn!("Captions disabled: {:#}", e);
                None
            }
        };
        Self { text }
    }

    /// Draws the scene into the pixmap, depth-first, skipping hidden
    /// subtrees.
    pub fn render(&self, scene: &SceneGraph, pixmap: &mut Pixmap) {
        pixmap.fill(Color::BLACK);
        self.render_node(scene, scene.root(), 0, 0, pixmap);
    }

    fn render_node(&self, scene: &SceneGraph, id: NodeId, ox: i32, oy: i32, pixmap: &mut Pixmap) {
        let node = scene.node(id);
        if node.hidden {
            return;
        }
        let x = ox + node.x;
        let y = oy + node.y;
        match &node.kind {
            NodeKind::Group { children } => {
                for child in children {
                    self.render_node(scene, *child, x, y, pixmap);
                }
            }
            NodeKind::Leaf { content, .. } => self.render_leaf(content, x, y, pixmap),
        }
    }

    fn render_leaf(&self, content: &Content, x: i32, y: i32, pixmap: &mut Pixmap) {
        match content {
            Content::Qr {
                bitmap,
                scale,
                fg,
                bg,
            } => {
                let scale = *scale as i32;
                let side = (bitmap.size() + 2 * QUIET_MODULES) as i32 * scale;
                fill_rect(pixmap, x, y, side as u32, side as u32, *bg);
                let origin_x = x + QUIET_MODULES as i32 * scale;
                let origin_y = y + QUIET_MODULES as i32 * scale;
                for my in 0..bitmap.size() {
                    for mx in 0..bitmap.size() {
                        if bitmap.module(mx, my) {
                            fill_rect(
                                pixmap,
                                origin_x + mx as i32 * scale,
                                origin_y + my as i32 * scale,
                                scale as u32,
                                scale as u32,
                                *fg,
                            );
                        }
                    }
                }
            }
            Content::Image(image) => blit_rgba(pixmap, x, y, image),
            Content::Text { text, size, color } => {
                if let Some(renderer) = &self.text {
                    renderer.draw_text(pixmap, x, y, text, *size, *color);
                }
            }
        }
    }
}

/// Fills an axis-aligned rectangle with an opaque RGB888 color.
fn fill_rect(pixmap: &mut Pixmap, x: i32, y: i32, width: u32, height: u32, color: u32) {
    let r = ((color >> 16) & 0xFF) as f32 / 255.0;
    let g = ((color >> 8) & 0xFF) as f32 / 255.0;
    let b = (color & 0xFF) as f32 / 255.0;

    let mut paint = Paint::default();
    if let Some(c) = Color::from_rgba(r, g, b, 1.0) {
        paint.set_color(c);
    }

    if let Some(rect) = Rect::from_xywh(x as f32, y as f32, width as f32, height as f32) {
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }
}

/// Alpha-blends a decoded RGBA image over the pixmap.
fn blit_rgba(pixmap: &mut Pixmap, x: i32, y: i32, image: &image::RgbaImage) {
    let pw = pixmap.width();
    let ph = pixmap.height();
    let data = pixmap.data_mut();

    for (ix, iy, pixel) in image.enumerate_pixels() {
        let px = x + ix as i32;
        let py = y + iy as i32;
        if px < 0 || py < 0 || px as u32 >= pw || py as u32 >= ph {
            continue;
        }
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }
        let idx = (py as u32 * pw + px as u32) as usize * 4;
        let alpha = a as f32 / 255.0;
        let inv = 1.0 - alpha;
        data[idx] = (r as f32 * alpha + data[idx] as f32 * inv) as u8;
        data[idx + 1] = (g as f32 * alpha + data[idx + 1] as f32 * inv) as u8;
        data[idx + 2] = (b as f32 * alpha + data[idx + 2] as f32 * inv) as u8;
        data[idx + 3] = 255;
    }
}

/// Converts the logical pixmap into the native framebuffer, applying the
/// session rotation. The pixmap must have the logical dimensions for the
/// rotation; the framebuffer stays at the panel's native size.
pub fn pixmap_to_framebuffer(pixmap: &Pixmap, fb: &mut Framebuffer, rotation: Rotation) {
    let lw = pixmap.width() as i32;
    let lh = pixmap.height() as i32;
    let data = pixmap.data();

    for y in 0..lh {
        for x in 0..lw {
            let idx = ((y * lw + x) as usize) * 4;
            let color = rgb888_to_rgb565(data[idx], data[idx + 1], data[idx + 2]);
            let (rx, ry) = rotation.invert(x, y, lw, lh);
            fb.set_pixel(rx as u16, ry as u16, color);
        }
    }
}
