//! Configuration management.
//!
//! Settings come from a TOML file with per-field defaults, then environment
//! variables (`QRBAR_*`) override the provisioning keys so the daemon can be
//! pointed at a network without editing files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Main loop poll interval in milliseconds.
    #[serde(default = "default_poll")]
    pub poll: u64,

    /// Display rotation in degrees (0, 90, 180 or 270).
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Path to the fallback image shown when no address is available.
    #[serde(default = "default_fallback_image")]
    pub fallback_image: String,

    /// Path to a TTF font for caption rendering.
    #[serde(default = "default_font")]
    pub font: String,

    /// WiFi credentials shown in the join QR.
    #[serde(default)]
    pub wifi: WifiConfig,

    /// Web workflow endpoint shown in the URL QR.
    #[serde(default)]
    pub web: WebConfig,
}

/// WiFi credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiConfig {
    /// Network SSID.
    #[serde(default = "default_unset")]
    pub ssid: String,

    /// Network password.
    #[serde(default = "default_unset")]
    pub password: String,

    /// Security type (WPA, WEP or nopass).
    #[serde(default = "default_security")]
    pub security: String,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: default_unset(),
            password: default_unset(),
            security: default_security(),
        }
    }
}

/// Web workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Web API port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Web API password.
    #[serde(default = "default_web_password")]
    pub password: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            password: default_web_password(),
        }
    }
}

// Default value functions
fn default_poll() -> u64 {
    100
}

fn default_rotation() -> String {
    "90".to_string()
}

fn default_fallback_image() -> String {
    "assets/splash.bmp".to_string()
}

fn default_font() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf".to_string()
}

fn default_unset() -> String {
    "*Unset*".to_string()
}

fn default_security() -> String {
    "WPA".to_string()
}

fn default_port() -> u16 {
    80
}

fn default_web_password() -> String {
    "password".to_string()
}

impl Config {
    /// Loads configuration from a TOML file, falling back to defaults when
    /// the file is missing (the daemon must come up unattended), then applies
    /// environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path.as_ref()) {
            Ok(content) => {
                toml::from_str(&content).context("Failed to parse configuration")?
            }
            Err(e) => {
                warn!(
                    "Configuration file {:?} not readable ({}), using defaults",
                    path.as_ref(),
                    e
                );
                Config::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Applies `QRBAR_*` environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("QRBAR_WIFI_SSID") {
            self.wifi.ssid = v;
        }
        if let Ok(v) = std::env::var("QRBAR_WIFI_PASSWORD") {
            self.wifi.password = v;
        }
        if let Ok(v) = std::env::var("QRBAR_WIFI_SECURITY") {
            self.wifi.security = v;
        }
        if let Ok(v) = std::env::var("QRBAR_WEB_PORT") {
            match v.parse() {
                Ok(port) => self.web.port = port,
                Err(_) => warn!("Ignoring invalid QRBAR_WEB_PORT: {}", v),
            }
        }
        if let Ok(v) = std::env::var("QRBAR_WEB_PASSWORD") {
            self.web.password = v;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll: default_poll(),
            rotation: default_rotation(),
            fallback_image: default_fallback_image(),
            font: default_font(),
            wifi: WifiConfig::default(),
            web: WebConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.poll, 100);
        assert_eq!(config.rotation, "90");
        assert_eq!(config.wifi.ssid, "*Unset*");
        assert_eq!(config.wifi.security, "WPA");
        assert_eq!(config.web.port, 80);
        assert_eq!(config.web.password, "password");
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            poll = 250

            [wifi]
            ssid = "workshop"
            "#,
        )
        .unwrap();
        assert_eq!(config.poll, 250);
        assert_eq!(config.wifi.ssid, "workshop");
        // Unspecified fields keep their defaults
        assert_eq!(config.wifi.password, "*Unset*");
        assert_eq!(config.web.port, 80);
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::default();
        std::env::set_var("QRBAR_WIFI_SSID", "override-net");
        std::env::set_var("QRBAR_WEB_PORT", "8080");
        config.apply_env();
        std::env::remove_var("QRBAR_WIFI_SSID");
        std::env::remove_var("QRBAR_WEB_PORT");

        assert_eq!(config.wifi.ssid, "override-net");
        assert_eq!(config.web.port, 8080);
    }
}
