//! Core types for Kino Live

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Default heartbeat period
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Unique identifier for one tracker attachment (log correlation only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerId(pub Uuid);

impl TrackerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrackerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of streaming event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Live,
    Scheduled,
    Vod,
}

impl EventType {
    /// Parse the wire value; unknown values yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "live" => Some(EventType::Live),
            "scheduled" => Some(EventType::Scheduled),
            "vod" => Some(EventType::Vod),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Live => write!(f, "live"),
            EventType::Scheduled => write!(f, "scheduled"),
            EventType::Vod => write!(f, "vod"),
        }
    }
}

/// Whether a resolved URL serves a live stream or an on-demand recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    Live,
    Vod,
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackMode::Live => write!(f, "live"),
            PlaybackMode::Vod => write!(f, "vod"),
        }
    }
}

/// A resolved playback URL together with its mode.
///
/// The pair only ever exists as a whole, so a URL without a mode (or the
/// reverse) is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackSource {
    pub url: String,
    pub mode: PlaybackMode,
}

impl PlaybackSource {
    pub fn live(url: impl Into<String>) -> Self {
        Self { url: url.into(), mode: PlaybackMode::Live }
    }

    pub fn vod(url: impl Into<String>) -> Self {
        Self { url: url.into(), mode: PlaybackMode::Vod }
    }
}

/// Named lifecycle events emitted by a media player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerEvent {
    Play,
    Pause,
    Ended,
    Dispose,
}

impl PlayerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::Play => "play",
            PlayerEvent::Pause => "pause",
            PlayerEvent::Ended => "ended",
            PlayerEvent::Dispose => "dispose",
        }
    }
}

impl std::fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Analytics session tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Period of the heartbeat timer
    pub heartbeat_interval: Duration,
}

impl TrackerConfig {
    /// Seconds reported by each heartbeat.
    ///
    /// Fixed per tick, not measured: a throttled or delayed timer still
    /// reports one full interval.
    pub fn heartbeat_seconds(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }

    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval.as_secs() == 0 {
            return Err(Error::InvalidConfig(
                "heartbeat_interval must be at least one second".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: HEARTBEAT_INTERVAL,
        }
    }
}

/// HTTP analytics client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsClientConfig {
    /// API base URL
    pub base_url: Url,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Path of the session-open endpoint
    pub start_path: String,
    /// Path of the heartbeat endpoint
    pub heartbeat_path: String,
    /// Path of the session-close endpoint
    pub end_path: String,
}

impl AnalyticsClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "unsupported scheme: {}",
                self.base_url.scheme()
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("request_timeout_ms must be non-zero".into()));
        }
        Ok(())
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }
}

impl Default for AnalyticsClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:3000/api").expect("static URL is valid"),
            request_timeout_ms: 10_000,
            start_path: "/analytics/session/start".to_string(),
            heartbeat_path: "/analytics/session/heartbeat".to_string(),
            end_path: "/analytics/session/end".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parse() {
        assert_eq!(EventType::parse("live"), Some(EventType::Live));
        assert_eq!(EventType::parse(" VOD "), Some(EventType::Vod));
        assert_eq!(EventType::parse("archived"), None);
    }

    #[test]
    fn test_heartbeat_seconds_default() {
        assert_eq!(TrackerConfig::default().heartbeat_seconds(), 10);
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = TrackerConfig {
            heartbeat_interval: Duration::from_millis(500),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_join_keeps_base_path() {
        let config = AnalyticsClientConfig::new(Url::parse("https://api.example.com/v1").unwrap());
        let url = config.endpoint(&config.start_path).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/analytics/session/start");
    }

    #[test]
    fn test_client_config_rejects_scheme() {
        let config = AnalyticsClientConfig::new(Url::parse("ftp://example.com").unwrap());
        assert!(config.validate().is_err());
    }
}
