//! Remote analytics session API
//!
//! The tracker talks to the analytics service only through [`AnalyticsApi`],
//! so transport (HTTP, in-process recorder, test fake) is injected.

mod http;

pub use http::HttpAnalyticsApi;

use crate::device::DeviceInfo;
use crate::types::PlaybackMode;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session-open payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub event_id: String,
    pub playback_type: PlaybackMode,
    pub device_info: DeviceInfo,
}

/// Session-open response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: String,
}

/// Periodic watch-time report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub session_id: String,
    pub seconds: u64,
}

/// Session-close payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub session_id: String,
    /// Playback position at close, truncated to whole seconds
    pub duration: u64,
}

/// Remote analytics service
#[async_trait]
pub trait AnalyticsApi: Send + Sync + 'static {
    async fn start_session(&self, request: StartSessionRequest) -> Result<StartSessionResponse>;

    async fn heartbeat(&self, request: HeartbeatRequest) -> Result<()>;

    async fn end_session(&self, request: EndSessionRequest) -> Result<()>;
}

macro_rules! forward_analytics_api {
    ($wrapper:ident) => {
        #[async_trait]
        impl<T: AnalyticsApi + ?Sized> AnalyticsApi for $wrapper<T> {
            async fn start_session(
                &self,
                request: StartSessionRequest,
            ) -> Result<StartSessionResponse> {
                (**self).start_session(request).await
            }

            async fn heartbeat(&self, request: HeartbeatRequest) -> Result<()> {
                (**self).heartbeat(request).await
            }

            async fn end_session(&self, request: EndSessionRequest) -> Result<()> {
                (**self).end_session(request).await
            }
        }
    };
}

forward_analytics_api!(Box);
forward_analytics_api!(Arc);
