//! CLI command implementations

use crate::output::{field, print_json, OutputFormat};
use crate::sim::{CountingApi, LoggingApi, SharedCountingApi, SimulatedPlayer};
use anyhow::Context;
use kino_live_core::{
    AnalyticsApi, AnalyticsClientConfig, AnalyticsSessionTracker, DeviceProbe, EventView,
    HostDevice, HttpAnalyticsApi, NoPageLifecycle, PlaybackMode, PlayerEvent, SessionPhase,
    TrackerConfig,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Resolve a raw event payload
pub fn resolve(input: Option<PathBuf>, format: &str) -> anyhow::Result<()> {
    let raw = match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let payload: serde_json::Value =
        serde_json::from_str(&raw).context("event payload is not valid JSON")?;
    let view = EventView::from_raw(&payload);

    match OutputFormat::from(format) {
        OutputFormat::Json => print_json(&view.to_json())?,
        OutputFormat::Text => {
            println!("Event: {}", field(view.event_id()));
            println!("  Title:  {}", field(view.title()));
            println!(
                "  Type:   {}",
                view.event_type().map(|t| t.to_string()).unwrap_or_else(|| "-".into())
            );
            println!("  Status: {}", field(view.status()));
            println!("  VOD:    {}", field(view.vod_status()));
            match view.playback() {
                Some(source) => {
                    println!("\nPlayback:");
                    println!("  Mode: {}", source.mode);
                    println!("  URL:  {}", source.url);
                }
                None => println!("\nPlayback: unavailable (no usable source)"),
            }
        }
    }

    Ok(())
}

/// Print the device snapshot
pub fn device(format: &str) -> anyhow::Result<()> {
    let info = HostDevice::new().snapshot();

    match OutputFormat::from(format) {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Text => {
            println!("Device snapshot:");
            println!("  User agent: {}", field(info.user_agent.as_deref()));
            println!("  Platform:   {}", field(info.platform.as_deref()));
            println!("  Language:   {}", field(info.language.as_deref()));
            println!("  Timezone:   {}", field(info.timezone.as_deref()));
            println!(
                "  Cores:      {}",
                info.hardware_concurrency
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".into())
            );
        }
    }

    Ok(())
}

/// Options for the `simulate` command
pub struct SimulateOptions {
    pub event_id: String,
    pub mode: PlaybackMode,
    pub duration: u64,
    pub pause: u64,
    pub heartbeat: u64,
    pub analytics_url: Option<Url>,
    pub dry_run: bool,
}

/// Drive a simulated player through one viewing session
pub async fn simulate(options: SimulateOptions, format: &str) -> anyhow::Result<()> {
    let inner: Box<dyn AnalyticsApi> = if options.dry_run {
        Box::new(LoggingApi)
    } else {
        let url = options
            .analytics_url
            .clone()
            .context("--analytics-url (or KINO_LIVE_ANALYTICS_URL) is required unless --dry-run")?;
        Box::new(HttpAnalyticsApi::new(AnalyticsClientConfig::new(url))?)
    };
    let api: SharedCountingApi = Arc::new(CountingApi::new(inner));

    let player = Arc::new(SimulatedPlayer::default());
    let config = TrackerConfig {
        heartbeat_interval: Duration::from_secs(options.heartbeat),
    };
    let handle = AnalyticsSessionTracker::new(
        player.clone(),
        options.event_id.clone(),
        options.mode,
        api.clone(),
    )
    .with_config(config)
    .attach(Arc::new(NoPageLifecycle))?;

    info!(event_id = %options.event_id, mode = %options.mode, "Starting simulated playback");
    player.emit(PlayerEvent::Play);

    let pause_at = if options.pause > 0 { Some(options.duration / 2) } else { None };
    let mut elapsed = 0;
    while elapsed < options.duration {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, closing session");
                break;
            }
        }
        player.advance(1.0);
        elapsed += 1;

        if Some(elapsed) == pause_at {
            player.emit(PlayerEvent::Pause);
            tokio::time::sleep(Duration::from_secs(options.pause)).await;
            player.emit(PlayerEvent::Play);
        }
    }

    if handle.phase() == SessionPhase::Opening {
        warn!("Session still opening at end of playback");
    }
    if let Err(e) = handle.teardown().await {
        warn!(error = %e, "Session close reported an error");
    }

    let summary = api.summary();
    match OutputFormat::from(format) {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => {
            println!("\nSession summary:");
            println!("  Session:    {}", field(summary.session_id.as_deref()));
            println!("  Heartbeats: {} ({}s reported)", summary.heartbeats, summary.reported_seconds);
            println!("  Closed:     {}", summary.closed);
            println!(
                "  Duration:   {}",
                summary.duration.map(|d| format!("{d}s")).unwrap_or_else(|| "-".into())
            );
        }
    }

    Ok(())
}
