//! Device snapshot sent once when an analytics session opens.
//!
//! Only non-identifying environment attributes are collected. The client IP
//! is derived server-side and never part of the snapshot.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Screen metrics supplied by the embedding surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

/// Non-identifying bundle of client environment attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub pixel_ratio: Option<f64>,
    /// Approximate device memory in GiB
    pub device_memory: Option<f64>,
    /// Logical CPU core count
    pub hardware_concurrency: Option<u32>,
}

impl DeviceInfo {
    pub fn with_screen(mut self, screen: ScreenInfo) -> Self {
        self.screen_width = Some(screen.width);
        self.screen_height = Some(screen.height);
        self.pixel_ratio = Some(screen.pixel_ratio);
        self
    }

    pub fn with_device_memory(mut self, gib: f64) -> Self {
        self.device_memory = Some(gib);
        self
    }
}

/// Source of device snapshots
pub trait DeviceProbe: Send + Sync {
    fn snapshot(&self) -> DeviceInfo;
}

/// Probe for the host process environment
#[derive(Debug, Clone, Default)]
pub struct HostDevice {
    screen: Option<ScreenInfo>,
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen(screen: ScreenInfo) -> Self {
        Self { screen: Some(screen) }
    }
}

impl DeviceProbe for HostDevice {
    fn snapshot(&self) -> DeviceInfo {
        let info = DeviceInfo {
            user_agent: Some(format!(
                "{}/{} ({}; {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            )),
            platform: Some(std::env::consts::OS.to_string()),
            language: host_language(),
            timezone: Some(host_timezone()),
            hardware_concurrency: std::thread::available_parallelism()
                .ok()
                .and_then(|n| u32::try_from(n.get()).ok()),
            ..Default::default()
        };

        match self.screen {
            Some(screen) => info.with_screen(screen),
            None => info,
        }
    }
}

/// Fixed snapshot, for embedders that gather attributes themselves
impl DeviceProbe for DeviceInfo {
    fn snapshot(&self) -> DeviceInfo {
        self.clone()
    }
}

fn host_language() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .map(|value| {
            // en_US.UTF-8 -> en-US
            let tag = value.split(['.', '@']).next().unwrap_or_default();
            tag.replace('_', "-")
        })
}

fn host_timezone() -> String {
    match std::env::var("TZ") {
        Ok(tz) if !tz.is_empty() => tz,
        _ => Local::now().offset().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_snapshot_has_platform() {
        let info = HostDevice::new().snapshot();
        assert_eq!(info.platform.as_deref(), Some(std::env::consts::OS));
        assert!(info.user_agent.unwrap().starts_with("kino-live-core/"));
        assert!(info.timezone.is_some());
        assert!(info.screen_width.is_none());
    }

    #[test]
    fn test_screen_metrics_applied() {
        let probe = HostDevice::with_screen(ScreenInfo {
            width: 1920,
            height: 1080,
            pixel_ratio: 2.0,
        });
        let info = probe.snapshot();
        assert_eq!(info.screen_width, Some(1920));
        assert_eq!(info.screen_height, Some(1080));
        assert_eq!(info.pixel_ratio, Some(2.0));
    }

    #[test]
    fn test_serialized_fields_exclude_ip() {
        let info = DeviceInfo::default().with_device_memory(8.0);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["deviceMemory"], 8.0);
        assert!(json.get("ip").is_none());
        assert!(json.get("userAgent").is_some());
    }
}
