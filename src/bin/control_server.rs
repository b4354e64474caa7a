use anyhow::{Context, Result};
use clap::Parser;
use classroom_stream::shutdown::shutdown_signal;
use classroom_stream::{create_router, AppState, Config, ControlConfig};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Token and recording control API for classroom rooms
#[derive(Debug, Parser)]
#[command(name = "control-server", version)]
struct Args {
    /// Optional config file layered under the environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?;
    let host = args.host.unwrap_or_else(|| cfg.host.clone());
    let port = args.port.unwrap_or(cfg.port);

    let control = ControlConfig::from_config(&cfg);
    if control.credentials.is_none() {
        warn!("LIVEKIT_API_KEY / LIVEKIT_API_SECRET not set; token and recording calls will fail");
    }

    tokio::fs::create_dir_all(&control.recordings_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create recordings directory {}",
                control.recordings_dir.display()
            )
        })?;

    info!("Classroom control server v{}", env!("CARGO_PKG_VERSION"));
    info!("Platform: {}", cfg.livekit_url);
    info!("Recordings: {}", control.recordings_dir.display());
    if let Some(dir) = &control.viewer_dir {
        info!("Serving viewer from {}", dir.display());
    }

    let app = create_router(AppState::new(control, &cfg.livekit_url));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
