//! Analytics session tracker
//!
//! Binds one remote analytics session to a player's event stream:
//!
//! ```text
//! [idle] --first play--> [opening] --start_session ok--> [open]
//!   ^                        |                              |
//!   +--start_session err-----+                              |
//! [opening|open] --ended | dispose | unload | teardown--> [closed]
//! [idle] --teardown--> [closed]
//! ```
//!
//! An end trigger on an idle tracker is a no-op. `closed` is terminal for an
//! attachment; a new session requires a new [`AnalyticsSessionTracker::attach`].
//! Dropping the last reference to an open tracker closes its session on the
//! runtime, best effort.
//!
//! While open, a repeating timer reports a fixed increment per tick (the
//! configured interval, 10 s by default). Ticks are assumed not to be
//! missed; a throttled timer under-reports watch time. Heartbeat failures
//! are dropped without retry.

use crate::analytics::{AnalyticsApi, EndSessionRequest, HeartbeatRequest, StartSessionRequest};
use crate::device::{DeviceProbe, HostDevice};
use crate::player::{EventHandler, ListenerId, PageLifecycle, PlayerHandle};
use crate::types::{PlaybackMode, PlayerEvent, TrackerConfig, TrackerId};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// Externally visible session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session yet, waiting for first play
    Idle,
    /// `start_session` in flight
    Opening,
    /// Session open, heartbeat timer running
    Open,
    /// Session closed for good
    Closed,
}

enum SessionState {
    Idle,
    Opening,
    Open {
        session_id: String,
        heartbeat: JoinHandle<()>,
    },
    Closed,
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Opening => SessionPhase::Opening,
            SessionState::Open { .. } => SessionPhase::Open,
            SessionState::Closed => SessionPhase::Closed,
        }
    }
}

/// Tracker builder; consumed by [`attach`](Self::attach)
pub struct AnalyticsSessionTracker {
    player: Arc<dyn PlayerHandle>,
    event_id: String,
    playback_type: PlaybackMode,
    api: Arc<dyn AnalyticsApi>,
    device: Arc<dyn DeviceProbe>,
    config: TrackerConfig,
}

impl AnalyticsSessionTracker {
    pub fn new(
        player: Arc<dyn PlayerHandle>,
        event_id: impl Into<String>,
        playback_type: PlaybackMode,
        api: Arc<dyn AnalyticsApi>,
    ) -> Self {
        Self {
            player,
            event_id: event_id.into(),
            playback_type,
            api,
            device: Arc::new(HostDevice::new()),
            config: TrackerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_device_probe(mut self, device: Arc<dyn DeviceProbe>) -> Self {
        self.device = device;
        self
    }

    /// Subscribe to the player and page signals.
    ///
    /// Must be called from within a tokio runtime; player callbacks spawn
    /// their work onto it.
    pub fn attach(self, page: Arc<dyn PageLifecycle>) -> Result<TrackerHandle> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;

        let inner = Arc::new(Inner {
            id: TrackerId::new(),
            event_id: self.event_id,
            playback_type: self.playback_type,
            config: self.config,
            api: self.api,
            device: self.device,
            player: self.player,
            runtime,
            is_playing: AtomicBool::new(false),
            state: Mutex::new(SessionState::Idle),
        });

        inner.arm_first_play();
        inner.subscribe_playback();
        let unload_listener = page.on_unload(inner.end_trigger("unload"));

        info!(
            tracker_id = %inner.id,
            event_id = %inner.event_id,
            playback_type = %inner.playback_type,
            "Analytics tracker attached"
        );

        Ok(TrackerHandle {
            inner,
            page,
            unload_listener,
        })
    }
}

/// Live attachment of a tracker to one player
pub struct TrackerHandle {
    inner: Arc<Inner>,
    page: Arc<dyn PageLifecycle>,
    unload_listener: ListenerId,
}

impl TrackerHandle {
    pub fn id(&self) -> TrackerId {
        self.inner.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state().phase()
    }

    /// Id of the open session, if any
    pub fn session_id(&self) -> Option<String> {
        match &*self.inner.state() {
            SessionState::Open { session_id, .. } => Some(session_id.clone()),
            _ => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.inner.is_playing.load(Ordering::SeqCst)
    }

    /// Open the session now; no-op unless idle
    pub async fn start(&self) -> Result<()> {
        self.inner.start().await
    }

    /// Close the session now; no-op unless open
    pub async fn end(&self) -> Result<()> {
        self.inner.end().await
    }

    /// Drop the unload listener and force the session closed.
    ///
    /// Unlike [`end`](Self::end), this also closes an idle tracker so a later
    /// play cannot open a session.
    pub async fn teardown(self) -> Result<()> {
        self.page.remove_listener(self.unload_listener);
        self.inner.shutdown().await
    }
}

struct Inner {
    id: TrackerId,
    event_id: String,
    playback_type: PlaybackMode,
    config: TrackerConfig,
    api: Arc<dyn AnalyticsApi>,
    device: Arc<dyn DeviceProbe>,
    player: Arc<dyn PlayerHandle>,
    runtime: Handle,
    is_playing: AtomicBool,
    state: Mutex<SessionState>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the one-shot "play" trigger that opens the session
    fn arm_first_play(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let handler: EventHandler = Arc::new(move || {
            let Some(inner) = weak.upgrade() else { return };
            let runtime = inner.runtime.clone();
            runtime.spawn(async move {
                if let Err(e) = inner.start().await {
                    warn!(tracker_id = %inner.id, error = %e, "Analytics session failed to open");
                    if inner.state().phase() == SessionPhase::Idle {
                        inner.arm_first_play();
                    }
                }
            });
        });
        self.player.once(PlayerEvent::Play, handler);
    }

    fn subscribe_playback(self: &Arc<Self>) {
        for (event, playing) in [(PlayerEvent::Play, true), (PlayerEvent::Pause, false)] {
            let weak = Arc::downgrade(self);
            self.player.on(
                event,
                Arc::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.is_playing.store(playing, Ordering::SeqCst);
                    }
                }),
            );
        }

        self.player.on(PlayerEvent::Ended, self.end_trigger("ended"));
        self.player.on(PlayerEvent::Dispose, self.end_trigger("dispose"));
    }

    /// Handler that closes the session.
    ///
    /// Holds a strong reference: the player and page keep the tracker alive
    /// until they drop their listeners, so the end triggers work without the
    /// [`TrackerHandle`].
    fn end_trigger(self: &Arc<Self>, source: &'static str) -> EventHandler {
        let tracker = Arc::clone(self);
        Arc::new(move || {
            let inner = Arc::clone(&tracker);
            let runtime = inner.runtime.clone();
            runtime.spawn(async move {
                debug!(tracker_id = %inner.id, source, "End trigger fired");
                if let Err(e) = inner.end().await {
                    warn!(tracker_id = %inner.id, source, error = %e, "Analytics session close failed");
                }
            });
        })
    }

    fn position_seconds(&self) -> u64 {
        self.player
            .current_time()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .map(|t| t.trunc() as u64)
            .unwrap_or(0)
    }

    #[instrument(skip(self), fields(tracker_id = %self.id))]
    async fn start(self: &Arc<Self>) -> Result<()> {
        {
            let mut state = self.state();
            if !matches!(*state, SessionState::Idle) {
                debug!(phase = ?state.phase(), "Session start skipped");
                return Ok(());
            }
            *state = SessionState::Opening;
        }

        let request = StartSessionRequest {
            event_id: self.event_id.clone(),
            playback_type: self.playback_type,
            device_info: self.device.snapshot(),
        };

        let response = match self.api.start_session(request).await {
            Ok(response) => response,
            Err(e) => {
                let mut state = self.state();
                if matches!(*state, SessionState::Opening) {
                    *state = SessionState::Idle;
                }
                return Err(Error::session_start(e.to_string()));
            }
        };
        let session_id = response.session_id;

        {
            let mut state = self.state();
            if matches!(*state, SessionState::Opening) {
                let heartbeat = self.spawn_heartbeat(session_id.clone());
                *state = SessionState::Open {
                    session_id: session_id.clone(),
                    heartbeat,
                };
                info!(session_id = %session_id, "Analytics session opened");
                return Ok(());
            }
        }

        // Closed while the open was in flight.
        info!(session_id = %session_id, "Closing session opened after end trigger");
        let request = EndSessionRequest {
            session_id: session_id.clone(),
            duration: self.position_seconds(),
        };
        self.api.end_session(request).await.map_err(|e| Error::SessionEnd {
            session_id,
            reason: e.to_string(),
        })
    }

    fn spawn_heartbeat(self: &Arc<Self>, session_id: String) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.config.heartbeat_interval;

        self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                inner.beat(&session_id).await;
            }
        })
    }

    async fn beat(&self, session_id: &str) {
        let live = match &*self.state() {
            SessionState::Open { session_id: open, .. } => open == session_id,
            _ => false,
        };
        if !live || !self.is_playing.load(Ordering::SeqCst) {
            return;
        }

        let request = HeartbeatRequest {
            session_id: session_id.to_string(),
            seconds: self.config.heartbeat_seconds(),
        };
        match self.api.heartbeat(request).await {
            Ok(()) => debug!(tracker_id = %self.id, session_id, "Heartbeat sent"),
            Err(e) => debug!(tracker_id = %self.id, session_id, error = %e, "Heartbeat dropped"),
        }
    }

    #[instrument(skip(self), fields(tracker_id = %self.id))]
    async fn end(&self) -> Result<()> {
        let (session_id, heartbeat) = {
            let mut state = self.state();
            match std::mem::replace(&mut *state, SessionState::Closed) {
                SessionState::Open {
                    session_id,
                    heartbeat,
                } => (session_id, heartbeat),
                SessionState::Opening => {
                    debug!("Session closed while opening");
                    return Ok(());
                }
                SessionState::Idle => {
                    *state = SessionState::Idle;
                    return Ok(());
                }
                SessionState::Closed => return Ok(()),
            }
        };

        heartbeat.abort();

        let duration = self.position_seconds();
        info!(session_id = %session_id, duration, "Closing analytics session");

        let request = EndSessionRequest {
            session_id: session_id.clone(),
            duration,
        };
        self.api.end_session(request).await.map_err(|e| Error::SessionEnd {
            session_id,
            reason: e.to_string(),
        })
    }
}

impl Inner {
    /// Close for good: an idle tracker moves straight to closed
    async fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.state();
            if matches!(*state, SessionState::Idle) {
                *state = SessionState::Closed;
                return Ok(());
            }
        }
        self.end().await
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        let SessionState::Open { session_id, heartbeat } =
            std::mem::replace(state, SessionState::Closed)
        else {
            return;
        };
        heartbeat.abort();

        // Player and page listeners are gone; close on the runtime, best effort.
        let request = EndSessionRequest {
            session_id,
            duration: self.position_seconds(),
        };
        warn!(
            tracker_id = %self.id,
            session_id = %request.session_id,
            "Tracker dropped with open session, closing"
        );
        let api = Arc::clone(&self.api);
        let id = self.id;
        self.runtime.spawn(async move {
            if let Err(e) = api.end_session(request).await {
                warn!(tracker_id = %id, error = %e, "Analytics session close failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::StartSessionResponse;
    use crate::player::NoPageLifecycle;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct StillPlayer;

    impl PlayerHandle for StillPlayer {
        fn once(&self, _event: PlayerEvent, _handler: EventHandler) {}
        fn on(&self, _event: PlayerEvent, _handler: EventHandler) {}
        fn current_time(&self) -> Option<f64> {
            Some(f64::NAN)
        }
    }

    #[derive(Default)]
    struct EchoApi {
        ends: AtomicUsize,
    }

    #[async_trait]
    impl AnalyticsApi for EchoApi {
        async fn start_session(&self, request: StartSessionRequest) -> Result<StartSessionResponse> {
            Ok(StartSessionResponse {
                session_id: format!("s-{}", request.event_id),
            })
        }

        async fn heartbeat(&self, _request: HeartbeatRequest) -> Result<()> {
            Ok(())
        }

        async fn end_session(&self, _request: EndSessionRequest) -> Result<()> {
            self.ends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn tracker() -> AnalyticsSessionTracker {
        tracker_with(Arc::new(EchoApi::default()))
    }

    fn tracker_with(api: Arc<EchoApi>) -> AnalyticsSessionTracker {
        AnalyticsSessionTracker::new(Arc::new(StillPlayer), "e1", PlaybackMode::Live, api)
    }

    #[test]
    fn test_attach_requires_runtime() {
        let err = tracker().attach(Arc::new(NoPageLifecycle)).err().unwrap();
        assert_eq!(err.error_code(), "RUNTIME");
    }

    #[tokio::test]
    async fn test_attach_rejects_zero_interval() {
        let result = tracker()
            .with_config(TrackerConfig {
                heartbeat_interval: std::time::Duration::ZERO,
            })
            .attach(Arc::new(NoPageLifecycle));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_start_then_end_lifecycle() {
        let handle = tracker().attach(Arc::new(NoPageLifecycle)).unwrap();
        assert_eq!(handle.phase(), SessionPhase::Idle);
        assert!(!handle.is_playing());

        handle.start().await.unwrap();
        assert_eq!(handle.session_id().as_deref(), Some("s-e1"));

        // NaN position falls back to zero
        assert_eq!(handle.inner.position_seconds(), 0);

        handle.end().await.unwrap();
        assert_eq!(handle.phase(), SessionPhase::Closed);
    }

    #[tokio::test]
    async fn test_end_leaves_idle_tracker_open_for_play() {
        let handle = tracker().attach(Arc::new(NoPageLifecycle)).unwrap();

        handle.end().await.unwrap();
        assert_eq!(handle.phase(), SessionPhase::Idle);

        handle.start().await.unwrap();
        assert_eq!(handle.phase(), SessionPhase::Open);
    }

    #[tokio::test]
    async fn test_teardown_closes_idle_tracker() {
        let api = Arc::new(EchoApi::default());
        let handle = tracker_with(api.clone()).attach(Arc::new(NoPageLifecycle)).unwrap();
        let inner = Arc::clone(&handle.inner);

        handle.teardown().await.unwrap();
        assert_eq!(inner.state().phase(), SessionPhase::Closed);
        assert_eq!(api.ends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dropped_open_tracker_closes_session() {
        let api = Arc::new(EchoApi::default());
        let handle = tracker_with(api.clone()).attach(Arc::new(NoPageLifecycle)).unwrap();
        handle.start().await.unwrap();

        // The player and page here keep no listeners, so this is the last reference.
        drop(handle);
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        assert_eq!(api.ends.load(Ordering::SeqCst), 1);
    }
}
