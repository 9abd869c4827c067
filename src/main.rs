use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use live_caption::{
    create_router, AppState, CameraBackendFactory, CameraSource, CaptionSession, Config,
    HttpInferenceClient,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Stream camera frames to a captioning backend
#[derive(Debug, Parser)]
#[command(name = "live-caption", version)]
struct Args {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/live-caption")]
    config: String,

    /// Backend base URL
    #[arg(long, env = "LIVE_CAPTION_API_URL")]
    api_url: Option<String>,

    /// Camera source: "synthetic" or a device index
    #[arg(long)]
    camera: Option<CameraSource>,

    /// Control API bind address
    #[arg(long)]
    bind: Option<String>,

    /// Control API port
    #[arg(long)]
    port: Option<u16>,

    /// Start streaming immediately
    #[arg(long)]
    autostart: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load_with_api_url(&args.config, args.api_url.clone())?;

    info!("Live Caption v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Inference backend: {}", cfg.backend.api_url);

    let camera_source = match args.camera.clone() {
        Some(source) => source,
        None => cfg.camera_source()?,
    };
    let camera = CameraBackendFactory::create(camera_source, cfg.capture.warmup_frames)
        .context("Failed to create camera backend")?;

    let inference = Arc::new(HttpInferenceClient::new(
        &cfg.backend.api_url,
        cfg.health_timeout(),
        cfg.request_timeout(),
    ));

    let session = Arc::new(CaptionSession::new(cfg.session_config(), camera, inference));

    if args.autostart {
        if let Err(e) = session.start().await {
            warn!("Autostart failed: {}", e);
        }
    }

    let bind = args.bind.unwrap_or(cfg.service.http.bind);
    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Control API listening on http://{}", addr);

    let app = create_router(AppState::new(Arc::clone(&session)));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("Control API server failed")?;

    session.shutdown().await;

    Ok(())
}
