//! Kino Live Core - live/VOD event playback for Kino
//!
//! This crate provides the playback-side core of the event viewer:
//! - Event view normalization and playback source resolution
//! - Analytics session tracking bound to a player's event stream
//! - Device snapshots for session analytics
//! - HTTP transport for the analytics API
//! - Expiring auth token storage
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Kino Live Core                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  raw event JSON ──► ┌──────────────┐                            │
//! │                     │  EventView   │ ──► playback url + mode    │
//! │                     │   resolver   │                            │
//! │                     └──────────────┘                            │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │    Player    │──►│  Analytics   │──►│ AnalyticsApi │         │
//! │  │    events    │   │   Session    │   │  (HTTP/fake) │         │
//! │  └──────────────┘   │   Tracker    │   └──────────────┘         │
//! │  ┌──────────────┐   │              │   ┌──────────────┐         │
//! │  │ Page unload  │──►│              │◄──│ DeviceProbe  │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod event_view;
pub mod device;
pub mod player;
pub mod analytics;
pub mod tracker;
pub mod auth;

pub use error::{Error, Result};
pub use types::*;
pub use event_view::EventView;
pub use device::{DeviceInfo, DeviceProbe, HostDevice, ScreenInfo};
pub use player::{EventHandler, ListenerId, NoPageLifecycle, PageLifecycle, PlayerHandle};
pub use analytics::{
    AnalyticsApi, EndSessionRequest, HeartbeatRequest, HttpAnalyticsApi, StartSessionRequest,
    StartSessionResponse,
};
pub use tracker::{AnalyticsSessionTracker, SessionPhase, TrackerHandle};
pub use auth::{KeyValueStore, MemoryStore, TokenStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Kino Live Core initialized");
}
