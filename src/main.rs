use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wearable_gate::{create_router, spawn_sweeper, AppState, Clock, Config, Engine, SystemClock};

#[derive(Debug, Parser)]
#[command(name = "wearable-gate", version, about = "Transcript buffering and eligibility gate for wearable webhooks")]
struct Args {
    /// Configuration file (without extension; TOML/YAML/JSON are detected)
    #[arg(long, default_value = "config/wearable-gate")]
    config: String,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Dispatcher: {:?} (timeout {}s), buffer: {} messages / {} words / {}s flush timeout",
        cfg.dispatcher.kind,
        cfg.dispatcher.timeout_secs,
        cfg.buffer.max_messages,
        cfg.buffer.word_flush_threshold,
        cfg.buffer.flush_timeout_secs
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = Arc::new(Engine::from_config(&cfg, Arc::clone(&clock))?);

    let sweeper = spawn_sweeper(Arc::clone(engine.store()), clock);

    let app = create_router(AppState::new(engine));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    sweeper.abort();
    Ok(())
}
