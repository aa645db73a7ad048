// ============================
// campus-backend-bin/src/main.rs
// ============================
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use campus_backend::{
    auth::PassthroughDirectory,
    clock::SystemClock,
    config::{Settings, DEFAULT_CONFIG_FILE},
    middleware::spawn_cleanup,
    router,
    storage::FlatFileStorage,
    AppState,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Meeting lifecycle and access service
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "CAMPUS_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the bind address from the config
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }
    init_tracing(&settings);

    let storage = FlatFileStorage::new(&settings.data_dir)
        .with_context(|| format!("opening data dir {}", settings.data_dir.display()))?;

    let addr = settings.bind_addr;
    let state = Arc::new(AppState::new(
        Arc::new(storage),
        Arc::new(SystemClock),
        Arc::new(PassthroughDirectory),
        settings,
    ));

    // Forget clients whose window has passed
    let sweep_every = Duration::from_secs(state.settings.rate_limit.window_secs.max(1));
    spawn_cleanup(state.rate_limiter.clone(), sweep_every);

    let app = router::create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
