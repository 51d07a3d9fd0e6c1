//! Application state and the polling main loop.
//!
//! Startup builds the scene once, branching on whether a network address is
//! available; the loop then refreshes the address QR on change, dispatches
//! touches, mirrors the two buttons onto the backlight, and sleeps. Nothing
//! inside the loop is allowed to kill the process.

use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::compose::{Placement, QrCard, Screen};
use crate::config::Config;
use crate::dispatch::{Dispatcher, TouchHandler};
use crate::net::AddressSource;
use crate::scene::{Content, NodeKind};

/// Payload shown when there is no address to build a workflow URL from.
const WEB_WORKFLOW_HELP_URL: &str =
    "https://learn.adafruit.com/circuitpython-with-esp32-quick-start/setting-up-web-workflow";

/// Placeholder dimensions when the fallback image file cannot be read.
const PLACEHOLDER_SIZE: (u32, u32) = (270, 240);

pub struct App<A: AddressSource> {
    config: Config,
    screen: Screen,
    dispatcher: Dispatcher,
    address: A,
    web_card: QrCard,
    last_ip: Option<Ipv4Addr>,
}

impl<A: AddressSource> App<A> {
    /// Builds the initial scene and registers touch handlers.
    pub fn new(config: Config, mut screen: Screen, mut address: A) -> Result<Self> {
        let mut dispatcher = Dispatcher::new();
        let ip = address.ip_address();

        let (webpage, caption) = web_payload(ip, config.web.port);
        let web_card = QrCard::place(
            &mut screen,
            &webpage,
            &caption,
            &Placement {
                from_center_x: Some(100),
                y: 10,
                caption_x_offset: -30,
                ..Default::default()
            },
        )?;

        if ip.is_some() {
            // Connected: show the join-WiFi QR next to the URL QR and make
            // every QR tile toggle its own visibility on touch.
            let qrdata = format!(
                "WIFI:S:{};T:{};P:{};",
                config.wifi.ssid, config.wifi.security, config.wifi.password
            );
            let _wifi_card = QrCard::place(
                &mut screen,
                &qrdata,
                &format!("SSID: {}", config.wifi.ssid),
                &Placement {
                    from_center_x: Some(-330),
                    y: 10,
                    caption_x_offset: -30,
                    ..Default::default()
                },
            )?;

            for leaf in screen.scene().leaves() {
                if matches!(
                    screen.scene().node(leaf).kind,
                    NodeKind::Leaf {
                        content: Content::Qr { .. },
                        ..
                    }
                ) {
                    dispatcher.register(leaf, toggle_hidden_handler());
                }
            }
        } else {
            // Not connected: show the fallback image and let touches toggle
            // it away.
            let image = load_fallback_image(&config.fallback_image);
            let (w, h) = image.dimensions();
            screen.suspend_refresh();
            let root = screen.scene().root();
            let group = screen.scene_mut().add_group(root, 0, 0);
            let leaf = screen.scene_mut().add_leaf(
                group,
                20,
                40,
                Some((w, h)),
                Content::Image(image),
            );
            screen.resume_refresh()?;
            dispatcher.register(leaf, toggle_hidden_handler());
        }

        let app = Self {
            config,
            screen,
            dispatcher,
            address,
            web_card,
            last_ip: ip,
        };
        app.log_scene();
        Ok(app)
    }

    /// Runs the polling loop forever.
    pub async fn run(&mut self) {
        info!(
            "Entering main loop ({}x{} at {} deg, {}ms poll)",
            self.screen.width(),
            self.screen.height(),
            self.screen.rotation(),
            self.config.poll
        );
        loop {
            self.tick();
            tokio::time::sleep(Duration::from_millis(self.config.poll)).await;
        }
    }

    /// One loop iteration. Every failure is logged and swallowed; the loop
    /// must keep polling unattended.
    pub fn tick(&mut self) {
        if let Err(e) = self.refresh_address_card() {
            warn!("Address QR refresh failed: {:#}", e);
        }
        if let Err(e) = self.handle_touches() {
            warn!("Touch handling failed: {:#}", e);
        }
        if let Err(e) = self.handle_buttons() {
            warn!("Button handling failed: {:#}", e);
        }
        if let Err(e) = self.screen.present_if_dirty() {
            warn!("Frame presentation failed: {:#}", e);
        }
    }

    /// Rebuilds the web-workflow QR when the address changes.
    fn refresh_address_card(&mut self) -> Result<()> {
        let ip = self.address.ip_address();
        if ip != self.last_ip {
            let (webpage, caption) = web_payload(ip, self.config.web.port);
            info!("Address changed to {:?}, refreshing QR", ip);
            self.web_card.update(&mut self.screen, &webpage, &caption)?;
            self.last_ip = ip;
        }
        Ok(())
    }

    /// Polls the touch surface and dispatches each active point.
    fn handle_touches(&mut self) -> Result<()> {
        let touches = self.screen.poll_touches()?;
        for (finger, touch) in touches.into_iter().enumerate() {
            self.dispatch_touch(touch.x, touch.y, finger);
        }
        Ok(())
    }

    /// Rotation-corrects one raw touch point, filters out-of-bounds points,
    /// and dispatches the rest. Returns whether a handler ran.
    fn dispatch_touch(&mut self, raw_x: i32, raw_y: i32, finger: usize) -> bool {
        let w = self.screen.width() as i32;
        let h = self.screen.height() as i32;
        let (x, y) = self.screen.rotation().correct(raw_x, raw_y, w, h);
        debug!(
            "Touch {}: raw ({}, {}) corrected ({}, {})",
            finger, raw_x, raw_y, x, y
        );
        if x < 0 || x >= w || y < 0 || y >= h {
            debug!("Skipping out of bounds touch");
            return false;
        }
        self.dispatcher
            .dispatch(self.screen.scene_mut(), x, y, finger)
    }

    /// Mirrors the two discrete buttons onto the backlight.
    fn handle_buttons(&mut self) -> Result<()> {
        if self.screen.button_up()? {
            self.screen.set_backlight(true)?;
        }
        if self.screen.button_down()? {
            self.screen.set_backlight(false)?;
        }
        Ok(())
    }

    /// Dumps the scene's leaves at debug level.
    fn log_scene(&self) {
        for leaf in self.screen.scene().leaves() {
            let node = self.screen.scene().node(leaf);
            let what = match &node.kind {
                NodeKind::Leaf { content, size } => match content {
                    Content::Qr { .. } => format!("qr {:?}", size),
                    Content::Image(_) => format!("image {:?}", size),
                    Content::Text { text, .. } => format!("text {:?}", text),
                },
                NodeKind::Group { .. } => continue,
            };
            debug!("Scene leaf {:?} at ({}, {}): {}", leaf, node.x, node.y, what);
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[cfg(test)]
    pub(crate) fn web_card(&self) -> &QrCard {
        &self.web_card
    }
}

/// URL QR payload and caption for the current address.
fn web_payload(ip: Option<Ipv4Addr>, port: u16) -> (String, String) {
    match ip {
        Some(ip) => (format!("http://{}:{}/", ip, port), format!("IP: {}", ip)),
        None => (WEB_WORKFLOW_HELP_URL.to_string(), String::new()),
    }
}

/// Handler that flips the touched leaf's hidden flag.
fn toggle_hidden_handler() -> TouchHandler {
    Box::new(|scene, node, _x, _y, finger| {
        let hidden = !scene.is_hidden(node);
        debug!("Touch (finger {}) toggles {:?} hidden={}", finger, node, hidden);
        scene.set_hidden(node, hidden);
    })
}

/// Decodes the fallback image, degrading to a flat placeholder when the file
/// is unreadable so the touch demo still has something to toggle.
fn load_fallback_image(path: &str) -> image::RgbaImage {
    match image::open(path) {
        Ok(decoded) => decoded.to_rgba8(),
        Err(e) => {
            warn!("Fallback image {:?} unusable ({}), using placeholder", path, e);
            let (w, h) = PLACEHOLDER_SIZE;
            image::RgbaImage::from_pixel(w, h, image::Rgba([64, 64, 64, 255]))
        }
    }
}
