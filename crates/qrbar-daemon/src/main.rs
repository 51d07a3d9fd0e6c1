//! Qrbar Daemon
//!
//! Drives the bar touchscreen panel: shows a web-workflow URL QR and a
//! WiFi-join QR, dispatches touches against the scene, and maps the two
//! hardware buttons to the backlight.

mod app;
mod compose;
mod config;
mod dispatch;
mod net;
mod render;
mod scene;

use anyhow::{Context, Result};
use qrbar_hw::{PanelDevice, PanelPort, Rotation};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use compose::Screen;
use config::Config;
use net::WifiStatus;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.toml".to_string());
    let config = Config::load(&config_path).context("Failed to load configuration")?;
    info!("Loaded configuration from: {}", config_path);

    let rotation: Rotation = config
        .rotation
        .parse()
        .context("Invalid rotation in configuration")?;

    // Open the panel; without one, run headless (scene logic still works)
    let panel: Option<Box<dyn PanelPort>> = match PanelDevice::open() {
        Ok(device) => {
            info!("Panel device opened");
            Some(Box::new(device))
        }
        Err(e) => {
            warn!("Panel device not found: {}. Running in headless mode.", e);
            None
        }
    };

    let screen = Screen::new(rotation, &config.font, panel);
    let mut app = App::new(config, screen, WifiStatus::auto())?;

    // Run until a power cycle or a termination signal
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    tokio::select! {
        _ = app.run() => {}
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
    }

    Ok(())
}
