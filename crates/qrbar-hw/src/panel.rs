//! Panel device communication via USB HID.

use hidapi::{HidApi, HidDevice};
use std::ffi::CString;
use tracing::{debug, info};

use crate::framebuffer::Framebuffer;
use crate::protocol::{
    build_backlight_packet, build_blit_chunk, parse_input_report, CHUNK_COUNT,
};
use crate::touch::{BacklightControl, ButtonPad, TouchPoint, TouchSurface};
use crate::{Error, Result, PANEL_PID, PANEL_VID};

pub use crate::protocol::Input;

/// Everything the daemon needs from the panel: frame output, backlight, and
/// polled input. Implemented by [`PanelDevice`]; tests substitute fakes.
pub trait PanelPort: TouchSurface + ButtonPad + BacklightControl {
    /// Sends a full frame to the panel.
    fn blit(&mut self, fb: &Framebuffer) -> Result<()>;
}

/// The HID interface used for panel data transfer.
const PANEL_INTERFACE: i32 = 0;

/// Panel device controller.
pub struct PanelDevice {
    device: HidDevice,
    /// Last polled input report; button getters read this.
    last_input: Input,
}

impl PanelDevice {
    /// Opens the panel device by VID:PID.
    ///
    /// The device exposes multiple HID interfaces; interface 0 carries both
    /// display data and input reports.
    pub fn open() -> Result<Self> {
        let api = HidApi::new()?;

        let devices: Vec<_> = api
            .device_list()
            .filter(|d| d.vendor_id() == PANEL_VID && d.product_id() == PANEL_PID)
            .collect();

        if devices.is_empty() {
            return Err(Error::PanelNotFound);
        }

        for dev in &devices {
            debug!(
                "Found HID device: path={:?}, interface={}",
                dev.path(),
                dev.interface_number()
            );
        }

        let device_info = devices
            .iter()
            .find(|d| d.interface_number() == PANEL_INTERFACE)
            .or_else(|| devices.first())
            .ok_or(Error::PanelNotFound)?;

        let device = device_info.open_device(&api).map_err(|e| {
            debug!("Failed to open device: {}", e);
            Error::PanelNotFound
        })?;

        info!(
            "Panel device opened (VID:{:04X} PID:{:04X}, interface={})",
            PANEL_VID,
            PANEL_PID,
            device_info.interface_number()
        );

        Ok(Self {
            device,
            last_input: Input::default(),
        })
    }

    /// Opens a specific panel device by HID path.
    pub fn open_path(path: &str) -> Result<Self> {
        let api = HidApi::new()?;

        let cpath = CString::new(path).map_err(|_| Error::PanelNotFound)?;
        let device = api
            .open_path(cpath.as_c_str())
            .map_err(|_| Error::PanelNotFound)?;

        info!("Panel device opened at path: {}", path);

        Ok(Self {
            device,
            last_input: Input::default(),
        })
    }

    /// Polls the device for a pending input report without blocking.
    ///
    /// Refreshes the cached report; no pending report reads as no touches and
    /// released buttons.
    pub fn poll_input(&mut self) -> Result<Input> {
        let mut buf = [0u8; 64];
        let n = self.device.read_timeout(&mut buf, 0)?;
        self.last_input = parse_input_report(&buf[..n])?;
        Ok(self.last_input.clone())
    }
}

impl PanelPort for PanelDevice {
    fn blit(&mut self, fb: &Framebuffer) -> Result<()> {
        for chunk in 0..CHUNK_COUNT {
            let packet = build_blit_chunk(chunk, fb.data());
            self.device.write(&packet)?;
        }
        debug!("Frame blitted ({} chunks)", CHUNK_COUNT);
        Ok(())
    }
}

impl TouchSurface for PanelDevice {
    fn poll_touches(&mut self) -> Result<Vec<TouchPoint>> {
        Ok(self.poll_input()?.touches)
    }
}

impl ButtonPad for PanelDevice {
    fn button_up(&mut self) -> Result<bool> {
        Ok(self.last_input.button_up)
    }

    fn button_down(&mut self) -> Result<bool> {
        Ok(self.last_input.button_down)
    }
}

impl BacklightControl for PanelDevice {
    fn set_backlight(&mut self, on: bool) -> Result<()> {
        let packet = build_backlight_packet(on);
        self.device.write(&packet)?;
        debug!("Backlight {}", if on { "on" } else { "off" });
        Ok(())
    }
}
