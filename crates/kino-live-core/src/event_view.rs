//! Event view - normalized view-state for one streaming event
//!
//! Turns a raw event payload (arbitrary JSON object, any key may be missing
//! or malformed) into an [`EventView`] with a single resolved playback
//! source. Resolution is a pure function of the payload: no I/O, no timers,
//! and nothing is carried over from a previously loaded view.
//!
//! Resolution order:
//! 1. `vodStatus == "READY"` with a non-empty `vodCloudFrontUrl` → VOD
//! 2. first non-empty of `cloudFrontUrl`, `mediaPackageUrl` → live
//! 3. otherwise unresolved

use crate::types::{EventType, PlaybackMode, PlaybackSource};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// VOD status value that makes a recording playable
pub const VOD_READY: &str = "READY";

const EVENT_ID_KEYS: &[&str] = &["eventId", "id"];
const TITLE_KEYS: &[&str] = &["title"];
const DESCRIPTION_KEYS: &[&str] = &["description"];
const EVENT_TYPE_KEYS: &[&str] = &["eventType"];
const STATUS_KEYS: &[&str] = &["status"];
const CLOUD_FRONT_URL_KEYS: &[&str] = &["cloudFrontUrl", "cloudfrontUrl"];
const MEDIA_PACKAGE_URL_KEYS: &[&str] = &["mediaPackageUrl", "mediapackageUrl"];
const RTMP_INPUT_URL_KEYS: &[&str] = &["rtmpInputUrl"];
const VOD_CLOUD_FRONT_URL_KEYS: &[&str] = &["vodCloudFrontUrl", "vodCloudfrontUrl"];
const VOD_STATUS_KEYS: &[&str] = &["vodStatus"];
const CHANNEL_STATE_KEYS: &[&str] = &["channelState"];
const CHANNEL_ID_KEYS: &[&str] = &["channelId", "mediaLiveChannelId"];
const DISTRIBUTION_ID_KEYS: &[&str] = &["distributionId", "cloudFrontDistributionId"];

/// Normalized view of a single event.
///
/// Rebuilt wholesale by [`EventView::load`]; the playback source is derived
/// during load and has no setter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    event_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    event_type: Option<EventType>,
    status: Option<String>,

    // Live source candidates
    cloud_front_url: Option<String>,
    media_package_url: Option<String>,
    rtmp_input_url: Option<String>,

    // VOD fields
    vod_cloud_front_url: Option<String>,
    vod_status: Option<String>,

    // Infrastructure passthrough
    channel_state: Option<String>,
    channel_id: Option<String>,
    distribution_id: Option<String>,

    #[serde(skip)]
    playback: Option<PlaybackSource>,

    is_watching: bool,
}

impl EventView {
    /// Build a view from a raw event payload.
    ///
    /// Never fails: anything that is not a JSON object yields the empty view.
    pub fn from_raw(raw: &Value) -> Self {
        match raw.as_object() {
            Some(map) => Self::from_map(map),
            None => Self::default(),
        }
    }

    /// Build a view from the fields of a raw event object
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        let mut view = Self {
            event_id: field(raw, EVENT_ID_KEYS),
            title: field(raw, TITLE_KEYS),
            description: field(raw, DESCRIPTION_KEYS),
            event_type: field(raw, EVENT_TYPE_KEYS).and_then(|t| EventType::parse(&t)),
            status: field(raw, STATUS_KEYS),
            cloud_front_url: field(raw, CLOUD_FRONT_URL_KEYS),
            media_package_url: field(raw, MEDIA_PACKAGE_URL_KEYS),
            rtmp_input_url: field(raw, RTMP_INPUT_URL_KEYS),
            vod_cloud_front_url: field(raw, VOD_CLOUD_FRONT_URL_KEYS),
            vod_status: field(raw, VOD_STATUS_KEYS),
            channel_state: field(raw, CHANNEL_STATE_KEYS),
            channel_id: field(raw, CHANNEL_ID_KEYS),
            distribution_id: field(raw, DISTRIBUTION_ID_KEYS),
            playback: None,
            is_watching: false,
        };
        view.playback = view.resolve_playback();

        debug!(
            event_id = view.event_id().unwrap_or("-"),
            mode = ?view.playback_mode(),
            "Event view resolved"
        );

        view
    }

    /// Replace this view with one built from `raw`.
    ///
    /// Re-resolves the playback source from scratch and clears `is_watching`.
    pub fn load(&mut self, raw: &Value) {
        *self = Self::from_raw(raw);
    }

    /// Return to the all-null initial shape
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_watching(&mut self, watching: bool) {
        self.is_watching = watching;
    }

    pub fn toggle_watching(&mut self) {
        self.is_watching = !self.is_watching;
    }

    /// Resolved playback source, if any candidate was usable
    pub fn playback(&self) -> Option<&PlaybackSource> {
        self.playback.as_ref()
    }

    pub fn playback_url(&self) -> Option<&str> {
        self.playback.as_ref().map(|p| p.url.as_str())
    }

    pub fn playback_mode(&self) -> Option<PlaybackMode> {
        self.playback.as_ref().map(|p| p.mode)
    }

    /// True when a playable source was resolved
    pub fn is_playable(&self) -> bool {
        self.playback.is_some()
    }

    fn resolve_playback(&self) -> Option<PlaybackSource> {
        if self.vod_status.as_deref() == Some(VOD_READY) {
            if let Some(url) = non_empty(&self.vod_cloud_front_url) {
                return Some(PlaybackSource::vod(url));
            }
        }

        [&self.cloud_front_url, &self.media_package_url]
            .into_iter()
            .find_map(non_empty)
            .map(PlaybackSource::live)
    }
}

/// Read-only field access
impl EventView {
    pub fn event_id(&self) -> Option<&str> {
        self.event_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn event_type(&self) -> Option<EventType> {
        self.event_type
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn cloud_front_url(&self) -> Option<&str> {
        self.cloud_front_url.as_deref()
    }

    pub fn media_package_url(&self) -> Option<&str> {
        self.media_package_url.as_deref()
    }

    pub fn rtmp_input_url(&self) -> Option<&str> {
        self.rtmp_input_url.as_deref()
    }

    pub fn vod_cloud_front_url(&self) -> Option<&str> {
        self.vod_cloud_front_url.as_deref()
    }

    pub fn vod_status(&self) -> Option<&str> {
        self.vod_status.as_deref()
    }

    pub fn channel_state(&self) -> Option<&str> {
        self.channel_state.as_deref()
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    pub fn distribution_id(&self) -> Option<&str> {
        self.distribution_id.as_deref()
    }

    pub fn is_watching(&self) -> bool {
        self.is_watching
    }
}

/// Flat wire shape with `playbackUrl` / `playbackMode` alongside the fields
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventViewWire<'a> {
    #[serde(flatten)]
    view: &'a EventView,
    playback_url: Option<&'a str>,
    playback_mode: Option<PlaybackMode>,
}

impl EventView {
    /// Serialize to the flat JSON shape consumed by the web player
    pub fn to_json(&self) -> serde_json::Value {
        let wire = EventViewWire {
            view: self,
            playback_url: self.playback_url(),
            playback_mode: self.playback_mode(),
        };
        serde_json::to_value(wire).unwrap_or(Value::Null)
    }
}

/// First present key wins; canonical key is listed first.
fn field(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
