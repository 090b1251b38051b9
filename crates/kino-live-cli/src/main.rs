//! Kino Live CLI - event playback resolution and analytics session tooling
//!
//! Features:
//! - Resolve a raw event payload to its playback source
//! - Print the device snapshot sent with analytics sessions
//! - Simulate a viewing session against the analytics API

use clap::{Parser, Subcommand, ValueEnum};
use kino_live_core::PlaybackMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;
mod output;
mod sim;

/// Kino Live CLI - event playback toolkit
#[derive(Parser)]
#[command(name = "kino-live")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Event playback resolution and analytics session toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Live,
    Vod,
}

impl From<ModeArg> for PlaybackMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Live => PlaybackMode::Live,
            ModeArg::Vod => PlaybackMode::Vod,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the playback source of a raw event payload
    Resolve {
        /// Path to event JSON (stdin when omitted or "-")
        input: Option<PathBuf>,
    },

    /// Show the device snapshot sent on session open
    Device,

    /// Simulate a viewing session with analytics tracking
    Simulate {
        /// Event identifier
        #[arg(short, long)]
        event_id: String,

        /// Playback type reported to analytics
        #[arg(short, long, value_enum, default_value = "live")]
        mode: ModeArg,

        /// Seconds of simulated playback
        #[arg(short, long, default_value = "30")]
        duration: u64,

        /// Pause for this many seconds halfway through
        #[arg(long, default_value = "0")]
        pause: u64,

        /// Heartbeat interval in seconds
        #[arg(long, default_value = "10")]
        heartbeat: u64,

        /// Analytics API base URL
        #[arg(long, env = "KINO_LIVE_ANALYTICS_URL")]
        analytics_url: Option<Url>,

        /// Log analytics calls instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if cli.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    kino_live_core::init();

    match cli.command {
        Commands::Resolve { input } => {
            commands::resolve(input, &cli.format)?;
        }
        Commands::Device => {
            commands::device(&cli.format)?;
        }
        Commands::Simulate {
            event_id,
            mode,
            duration,
            pause,
            heartbeat,
            analytics_url,
            dry_run,
        } => {
            let options = commands::SimulateOptions {
                event_id,
                mode: mode.into(),
                duration,
                pause,
                heartbeat,
                analytics_url,
                dry_run,
            };
            commands::simulate(options, &cli.format).await?;
        }
    }

    Ok(())
}
