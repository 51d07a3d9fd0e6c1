//! WiFi address reporting.
//!
//! The WiFi stack itself is the operating system's business; all the daemon
//! needs is "what IPv4 address does the panel's interface have right now",
//! polled cheaply from the main loop.

use std::ffi::CStr;
use std::fs;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tracing::info;

/// Source of the current network address. `None` means not connected.
pub trait AddressSource {
    fn ip_address(&mut self) -> Option<Ipv4Addr>;
}

/// Address source backed by the kernel's interface tables.
pub struct WifiStatus {
    interface: String,
    cached: Option<Ipv4Addr>,
    last_check: Option<Instant>,
    ttl: Duration,
}

impl WifiStatus {
    /// Creates a status source for a specific interface.
    pub fn new(interface: &str) -> Self {
        Self {
            interface: interface.to_string(),
            cached: None,
            last_check: None,
            ttl: Duration::from_secs(5),
        }
    }

    /// Creates a status source for the auto-detected default interface.
    pub fn auto() -> Self {
        let interface = Self::detect_interface().unwrap_or_else(|| "wlan0".to_string());
        info!("Watching interface: {}", interface);
        Self::new(&interface)
    }

    /// Detects the primary network interface from the default route, falling
    /// back to the first real interface under sysfs.
    pub fn detect_interface() -> Option<String> {
        if let Ok(content) = fs::read_to_string("/proc/net/route") {
            for line in content.lines().skip(1) {
                let fields: Vec<&str> = line.split_whitespace().collect();
                // Default route has destination 00000000
                if fields.len() >= 2 && fields[1] == "00000000" {
                    return Some(fields[0].to_string());
                }
            }
        }

        if let Ok(entries) = fs::read_dir("/sys/class/net") {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().to_string();
                if name == "lo" || name.starts_with("veth") || name.starts_with("docker") {
                    continue;
                }
                let stats_path = format!("/sys/class/net/{}/statistics/rx_bytes", name);
                if fs::metadata(&stats_path).is_ok() {
                    return Some(name);
                }
            }
        }

        None
    }

    /// Looks up the interface's IPv4 address using getifaddrs.
    fn lookup(interface: &str) -> Option<Ipv4Addr> {
        let mut found = None;

        // SAFETY: getifaddrs is a standard POSIX function; the list is freed
        // with freeifaddrs before returning.
        unsafe {
            let mut ifaddrs: *mut libc::ifaddrs = std::ptr::null_mut();
            if libc::getifaddrs(&mut ifaddrs) != 0 {
                return None;
            }

            let mut current = ifaddrs;
            while !current.is_null() {
                let ifa = &*current;
                if !ifa.ifa_name.is_null() && !ifa.ifa_addr.is_null() {
                    let name = CStr::from_ptr(ifa.ifa_name).to_string_lossy();
                    if name == interface
                        && (*ifa.ifa_addr).sa_family as i32 == libc::AF_INET
                        && found.is_none()
                    {
                        let sockaddr_in = ifa.ifa_addr as *const libc::sockaddr_in;
                        let addr_bytes = (*sockaddr_in).sin_addr.s_addr.to_ne_bytes();
                        found = Some(Ipv4Addr::from(addr_bytes));
                    }
                }
                current = ifa.ifa_next;
            }

            libc::freeifaddrs(ifaddrs);
        }

        found
    }
}

impl AddressSource for WifiStatus {
    fn ip_address(&mut self) -> Option<Ipv4Addr> {
        let stale = self
            .last_check
            .map(|t| t.elapsed() > self.ttl)
            .unwrap_or(true);
        if stale {
            // An all-zero address means the stack is still associating.
            self.cached =
                Self::lookup(&self.interface).filter(|ip| *ip != Ipv4Addr::UNSPECIFIED);
            self.last_check = Some(Instant::now());
        }
        self.cached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_lookup() {
        // Loopback exists on any test host; its address is well known.
        if let Some(ip) = WifiStatus::lookup("lo") {
            assert_eq!(ip, Ipv4Addr::LOCALHOST);
        }
    }

    #[test]
    fn test_unknown_interface_has_no_address() {
        let mut status = WifiStatus::new("does-not-exist0");
        assert_eq!(status.ip_address(), None);
    }
}
