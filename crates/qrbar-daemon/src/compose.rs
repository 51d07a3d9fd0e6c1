//! Display composition: the screen (scene + refresh gating + panel output)
//! and the QR-with-caption cards placed on it.

#![allow(dead_code)]

use anyhow::Result;
use qrbar_hw::{
    Framebuffer, PanelPort, QrBitmap, Rotation, TouchPoint, PANEL_HEIGHT, PANEL_WIDTH,
};
use tiny_skia::Pixmap;
use tracing::debug;

use crate::render::{pixmap_to_framebuffer, Renderer, QUIET_MODULES};
use crate::scene::{Content, NodeId, NodeKind, SceneGraph};

/// QR module color (dark).
const QR_FG: u32 = 0x121212;
/// QR background color.
const QR_BG: u32 = 0x0000AA;
/// Caption font size in pixels.
const CAPTION_SIZE: f32 = 24.0;
/// Caption color.
const CAPTION_COLOR: u32 = 0xFFFFFF;

/// The live display: scene graph, rasterizer, refresh gating and the panel
/// device. The panel is optional; without one the daemon runs headless.
pub struct Screen {
    scene: SceneGraph,
    rotation: Rotation,
    width: u32,
    height: u32,
    renderer: Renderer,
    pixmap: Pixmap,
    framebuffer: Framebuffer,
    panel: Option<Box<dyn PanelPort>>,
    auto_refresh: bool,
    dirty: bool,
}

impl Screen {
    pub fn new(rotation: Rotation, font_path: &str, panel: Option<Box<dyn PanelPort>>) -> Self {
        let (width, height) = rotation.dimensions(PANEL_WIDTH, PANEL_HEIGHT);
        let (width, height) = (width as u32, height as u32);
        let pixmap = Pixmap::new(width, height).expect("Failed to create pixmap");
        Self {
            scene: SceneGraph::new(),
            rotation,
            width,
            height,
            renderer: Renderer::new(font_path),
            pixmap,
            framebuffer: Framebuffer::new(PANEL_WIDTH, PANEL_HEIGHT),
            panel,
            auto_refresh: true,
            dirty: true,
        }
    }

    /// Logical display width for the session rotation.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical display height.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable scene access; marks the frame dirty.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        self.dirty = true;
        &mut self.scene
    }

    /// Stops frames from being presented until [`resume_refresh`] runs, so a
    /// batch of scene edits lands as a single frame.
    pub fn suspend_refresh(&mut self) {
        self.auto_refresh = false;
    }

    /// Re-enables presentation and flushes any pending edits.
    pub fn resume_refresh(&mut self) -> Result<()> {
        self.auto_refresh = true;
        self.present_if_dirty()
    }

    pub fn refresh_suspended(&self) -> bool {
        !self.auto_refresh
    }

    /// Rasterizes and blits the current scene if it changed since the last
    /// presented frame. A no-op while refresh is suspended.
    pub fn present_if_dirty(&mut self) -> Result<()> {
        if !self.auto_refresh || !self.dirty {
            return Ok(());
        }
        self.renderer.render(&self.scene, &mut self.pixmap);
        pixmap_to_framebuffer(&self.pixmap, &mut self.framebuffer, self.rotation);
        if let Some(panel) = &mut self.panel {
            panel.blit(&self.framebuffer)?;
        }
        self.dirty = false;
        Ok(())
    }

    /// Polls the panel for active touches (empty when headless).
    pub fn poll_touches(&mut self) -> Result<Vec<TouchPoint>> {
        match &mut self.panel {
            Some(panel) => Ok(panel.poll_touches()?),
            None => Ok(Vec::new()),
        }
    }

    pub fn button_up(&mut self) -> Result<bool> {
        match &mut self.panel {
            Some(panel) => Ok(panel.button_up()?),
            None => Ok(false),
        }
    }

    pub fn button_down(&mut self) -> Result<bool> {
        match &mut self.panel {
            Some(panel) => Ok(panel.button_down()?),
            None => Ok(false),
        }
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<()> {
        if let Some(panel) = &mut self.panel {
            panel.set_backlight(on)?;
        }
        Ok(())
    }
}

/// Where a QR card goes on the screen.
#[derive(Debug, Clone)]
pub struct Placement {
    /// Absolute position, used when no center-relative offset is given.
    pub x: i32,
    pub y: i32,
    /// Offsets resolved against the current display center.
    pub from_center_x: Option<i32>,
    pub from_center_y: Option<i32>,
    /// Pixels per QR module.
    pub scale: u32,
    /// Compensate for the code's own footprint so its corner, not its
    /// center, lands at the requested point.
    pub corner_offset: bool,
    /// Horizontal nudge for the caption relative to the card.
    pub caption_x_offset: i32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            from_center_x: None,
            from_center_y: None,
            scale: 8,
            corner_offset: false,
            caption_x_offset: -20,
        }
    }
}

/// A placed QR visual plus its caption; holds the identifiers needed to
/// update both later.
pub struct QrCard {
    group: NodeId,
    label: NodeId,
    x: i32,
    y: i32,
    scale: u32,
}

impl QrCard {
    /// Encodes the payload and appends a QR group and caption to the scene.
    pub fn place(
        screen: &mut Screen,
        payload: &str,
        caption: &str,
        placement: &Placement,
    ) -> Result<Self> {
        let mut x = placement.x;
        let mut y = placement.y;
        if let Some(dx) = placement.from_center_x {
            x = screen.width() as i32 / 2 + dx;
        }
        if let Some(dy) = placement.from_center_y {
            y = screen.height() as i32 / 2 + dy;
        }
        if placement.corner_offset {
            let scale = placement.scale as i32;
            x -= (scale + 5) * scale;
            y -= (scale + 4) * scale;
        }

        let caption_x = x + placement.caption_x_offset;
        let caption_y = (screen.height() as f32 * 0.9) as i32;

        screen.suspend_refresh();
        let group = append_qr_group(screen, payload, x, y, placement.scale)?;
        let root = screen.scene().root();
        let label = screen.scene_mut().add_leaf(
            root,
            caption_x,
            caption_y,
            None,
            Content::Text {
                text: caption.to_string(),
                size: CAPTION_SIZE,
                color: CAPTION_COLOR,
            },
        );
        screen.resume_refresh()?;

        debug!("Placed QR card at ({}, {})", x, y);
        Ok(Self {
            group,
            label,
            x,
            y,
            scale: placement.scale,
        })
    }

    /// Replaces the QR visual with one for a new payload and rewrites the
    /// caption in place. Presentation is suspended across the swap so no
    /// partial frame is shown.
    pub fn update(&mut self, screen: &mut Screen, payload: &str, caption: &str) -> Result<()> {
        screen.suspend_refresh();
        let root = screen.scene().root();
        screen.scene_mut().remove_child(root, self.group);
        self.group = append_qr_group(screen, payload, self.x, self.y, self.scale)?;
        self.write_caption(screen, caption);
        screen.resume_refresh()?;
        debug!("QR card replaced at ({}, {})", self.x, self.y);
        Ok(())
    }

    /// Rewrites the caption only; the QR visual is untouched.
    pub fn set_caption(&self, screen: &mut Screen, caption: &str) {
        self.write_caption(screen, caption);
    }

    fn write_caption(&self, screen: &mut Screen, caption: &str) {
        let node = screen.scene_mut().node_mut(self.label);
        if let NodeKind::Leaf {
            content: Content::Text { text, .. },
            ..
        } = &mut node.kind
        {
            *text = caption.to_string();
        }
    }

    /// The QR group's node id.
    pub fn group(&self) -> NodeId {
        self.group
    }

    /// The caption leaf's node id.
    pub fn label(&self) -> NodeId {
        self.label
    }
}

/// Builds a group holding one QR leaf and appends it to the scene root.
fn append_qr_group(
    screen: &mut Screen,
    payload: &str,
    x: i32,
    y: i32,
    scale: u32,
) -> Result<NodeId> {
    let bitmap = QrBitmap::encode(payload)?;
    let side = (bitmap.size() + 2 * QUIET_MODULES) * scale;
    let scene = screen.scene_mut();
    let root = scene.root();
    let group = scene.add_group(root, x, y);
    scene.add_leaf(
        group,
        0,
        0,
        Some((side, side)),
        Content::Qr {
            bitmap,
            scale,
            fg: QR_FG,
            bg: QR_BG,
        },
    );
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;

    fn headless_screen() -> Screen {
        Screen::new(Rotation::Deg90, "/nonexistent/font.ttf", None)
    }

    fn qr_groups(scene: &SceneGraph) -> Vec<NodeId> {
        scene
            .children(scene.root())
            .iter()
            .copied()
            .filter(|id| {
                scene.children(*id).iter().any(|leaf| {
                    matches!(
                        scene.node(*leaf).kind,
                        NodeKind::Leaf {
                            content: Content::Qr { .. },
                            ..
                        }
                    )
                })
            })
            .collect()
    }

    fn caption_text(scene: &SceneGraph, label: NodeId) -> String {
        match &scene.node(label).kind {
            NodeKind::Leaf {
                content: Content::Text { text, .. },
                ..
            } => text.clone(),
            _ => panic!("label is not a text leaf"),
        }
    }

    #[test]
    fn test_logical_dimensions_follow_rotation() {
        let screen = headless_screen();
        assert_eq!((screen.width(), screen.height()), (820, 320));
    }

    #[test]
    fn test_center_relative_placement() {
        let mut screen = headless_screen();
        let card = QrCard::place(
            &mut screen,
            "https://example.invalid/",
            "",
            &Placement {
                from_center_x: Some(100),
                y: 10,
                ..Default::default()
            },
        )
        .unwrap();

        let node = screen.scene().node(card.group());
        assert_eq!(node.x, 820 / 2 + 100);
        assert_eq!(node.y, 10);
    }

    #[test]
    fn test_corner_offset_compensation() {
        let mut screen = headless_screen();
        let card = QrCard::place(
            &mut screen,
            "corner",
            "",
            &Placement {
                x: 400,
                y: 300,
                scale: 8,
                corner_offset: true,
                ..Default::default()
            },
        )
        .unwrap();

        let node = screen.scene().node(card.group());
        assert_eq!(node.x, 400 - (8 + 5) * 8);
        assert_eq!(node.y, 300 - (8 + 4) * 8);
    }

    #[test]
    fn test_update_swaps_exactly_one_qr_group() {
        let mut screen = headless_screen();
        let mut card = QrCard::place(
            &mut screen,
            "http://10.0.0.5:80/",
            "IP: 10.0.0.5",
            &Placement::default(),
        )
        .unwrap();
        let old_group = card.group();
        assert_eq!(qr_groups(screen.scene()), vec![old_group]);

        card.update(&mut screen, "http://10.0.0.9:80/", "IP: 10.0.0.9")
            .unwrap();

        let groups = qr_groups(screen.scene());
        assert_eq!(groups.len(), 1);
        assert_ne!(groups[0], old_group);
        assert_eq!(groups[0], card.group());
        assert_eq!(caption_text(screen.scene(), card.label()), "IP: 10.0.0.9");
        // Refresh gating was restored after the atomic swap.
        assert!(!screen.refresh_suspended());
    }

    #[test]
    fn test_caption_update_in_place() {
        let mut screen = headless_screen();
        let card =
            QrCard::place(&mut screen, "payload", "before", &Placement::default()).unwrap();
        card.set_caption(&mut screen, "after");
        assert_eq!(caption_text(screen.scene(), card.label()), "after");
    }
}
