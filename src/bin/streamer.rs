use anyhow::{Context, Result};
use clap::Parser;
use classroom_stream::media::FfmpegPusher;
use classroom_stream::platform::IngressConnector;
use classroom_stream::shutdown::shutdown_signal;
use classroom_stream::{Config, StreamerConfig, Supervisor};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Publish a classroom camera and microphone into a room, reconnecting forever
#[derive(Debug, Parser)]
#[command(name = "streamer", version)]
struct Args {
    /// Optional config file layered under the environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Room to publish into (overrides ROOM_NAME)
    #[arg(short, long)]
    room: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(room) = args.room {
        cfg.room_name = Some(room);
    }

    let streamer = StreamerConfig::from_config(&cfg)?;
    let credentials = cfg
        .credentials()
        .context("LIVEKIT_API_KEY and LIVEKIT_API_SECRET must be set")?;

    info!("Classroom streamer v{}", env!("CARGO_PKG_VERSION"));
    info!("Platform: {}", cfg.livekit_url);
    info!("Camera: {}", streamer.rtsp_url);
    info!("Microphone: {}", streamer.mic_device);

    let pusher = FfmpegPusher::detect(cfg.ffmpeg_path.clone()).await;
    let connector = IngressConnector::new(&cfg.livekit_url, credentials, pusher);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    Supervisor::new(streamer, Arc::new(connector), stop_rx)
        .run()
        .await;

    Ok(())
}
