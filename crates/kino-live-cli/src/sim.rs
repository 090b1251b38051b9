//! Simulated player and analytics wiring for the `simulate` command

use async_trait::async_trait;
use kino_live_core::{
    AnalyticsApi, EndSessionRequest, EventHandler, HeartbeatRequest, PlayerEvent, PlayerHandle,
    StartSessionRequest, StartSessionResponse,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;
use uuid::Uuid;

/// Headless player driven by the simulation loop
#[derive(Default)]
pub struct SimulatedPlayer {
    handlers: Mutex<Vec<(PlayerEvent, EventHandler, bool)>>,
    position: Mutex<f64>,
}

impl SimulatedPlayer {
    pub fn emit(&self, event: PlayerEvent) {
        let fire: Vec<EventHandler> = {
            let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
            let mut fire = Vec::new();
            handlers.retain(|(e, handler, once)| {
                if *e != event {
                    return true;
                }
                fire.push(handler.clone());
                !*once
            });
            fire
        };

        info!(event = %event, position = self.position(), "Player event");
        for handler in fire {
            handler();
        }
    }

    pub fn advance(&self, seconds: f64) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) += seconds;
    }

    pub fn position(&self) -> f64 {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlayerHandle for SimulatedPlayer {
    fn once(&self, event: PlayerEvent, handler: EventHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event, handler, true));
    }

    fn on(&self, event: PlayerEvent, handler: EventHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event, handler, false));
    }

    fn current_time(&self) -> Option<f64> {
        Some(self.position())
    }
}

/// Analytics API that only logs, for dry runs
pub struct LoggingApi;

#[async_trait]
impl AnalyticsApi for LoggingApi {
    async fn start_session(
        &self,
        request: StartSessionRequest,
    ) -> kino_live_core::Result<StartSessionResponse> {
        let session_id = Uuid::new_v4().to_string();
        info!(
            event_id = %request.event_id,
            playback_type = %request.playback_type,
            device = ?request.device_info,
            session_id = %session_id,
            "[dry-run] start session"
        );
        Ok(StartSessionResponse { session_id })
    }

    async fn heartbeat(&self, request: HeartbeatRequest) -> kino_live_core::Result<()> {
        info!(session_id = %request.session_id, seconds = request.seconds, "[dry-run] heartbeat");
        Ok(())
    }

    async fn end_session(&self, request: EndSessionRequest) -> kino_live_core::Result<()> {
        info!(session_id = %request.session_id, duration = request.duration, "[dry-run] end session");
        Ok(())
    }
}

/// Session summary printed when the simulation finishes
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Option<String>,
    pub heartbeats: u64,
    pub reported_seconds: u64,
    pub closed: bool,
    pub duration: Option<u64>,
}

/// Decorator recording what reached the inner API
pub struct CountingApi<A> {
    inner: A,
    heartbeats: AtomicU64,
    reported_seconds: AtomicU64,
    summary: Mutex<SessionSummary>,
}

impl<A: AnalyticsApi> CountingApi<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            heartbeats: AtomicU64::new(0),
            reported_seconds: AtomicU64::new(0),
            summary: Mutex::new(SessionSummary::default()),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let mut summary = self.summary.lock().unwrap_or_else(PoisonError::into_inner).clone();
        summary.heartbeats = self.heartbeats.load(Ordering::SeqCst);
        summary.reported_seconds = self.reported_seconds.load(Ordering::SeqCst);
        summary
    }
}

#[async_trait]
impl<A: AnalyticsApi> AnalyticsApi for CountingApi<A> {
    async fn start_session(
        &self,
        request: StartSessionRequest,
    ) -> kino_live_core::Result<StartSessionResponse> {
        let response = self.inner.start_session(request).await?;
        self.summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .session_id = Some(response.session_id.clone());
        Ok(response)
    }

    async fn heartbeat(&self, request: HeartbeatRequest) -> kino_live_core::Result<()> {
        let seconds = request.seconds;
        self.inner.heartbeat(request).await?;
        self.heartbeats.fetch_add(1, Ordering::SeqCst);
        self.reported_seconds.fetch_add(seconds, Ordering::SeqCst);
        Ok(())
    }

    async fn end_session(&self, request: EndSessionRequest) -> kino_live_core::Result<()> {
        let duration = request.duration;
        let result = self.inner.end_session(request).await;
        let mut summary = self.summary.lock().unwrap_or_else(PoisonError::into_inner);
        summary.closed = result.is_ok();
        summary.duration = Some(duration);
        result
    }
}

/// Shared handle so the tracker and the command both see the counters
pub type SharedCountingApi = Arc<CountingApi<Box<dyn AnalyticsApi>>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_once_handlers_fire_once() {
        let player = SimulatedPlayer::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        player.once(
            PlayerEvent::Play,
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        player.emit(PlayerEvent::Play);
        player.emit(PlayerEvent::Play);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_position_advances() {
        let player = SimulatedPlayer::default();
        player.advance(1.5);
        player.advance(2.0);
        assert_eq!(player.current_time(), Some(3.5));
    }

    #[tokio::test]
    async fn test_counting_api_summary() {
        let api = CountingApi::new(LoggingApi);
        let response = api
            .start_session(StartSessionRequest {
                event_id: "e".into(),
                playback_type: kino_live_core::PlaybackMode::Live,
                device_info: Default::default(),
            })
            .await
            .unwrap();
        api.heartbeat(HeartbeatRequest {
            session_id: response.session_id.clone(),
            seconds: 10,
        })
        .await
        .unwrap();
        api.end_session(EndSessionRequest {
            session_id: response.session_id.clone(),
            duration: 12,
        })
        .await
        .unwrap();

        let summary = api.summary();
        assert_eq!(summary.session_id, Some(response.session_id));
        assert_eq!(summary.heartbeats, 1);
        assert_eq!(summary.reported_seconds, 10);
        assert!(summary.closed);
        assert_eq!(summary.duration, Some(12));
    }
}
