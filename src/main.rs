use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parley_server::{
    api::{
        rate_limiter::RateLimiter,
        routes::{self, AppState},
    },
    auth::TokenVerifier,
    config::Config,
    services::{ChatService, UploadSigner},
    storage::{self, SeaOrmChatRepository},
};

#[derive(Debug, Parser)]
#[command(name = "parley-server", version, about = "Chat history server")]
struct Cli {
    /// Config file (defaults to ~/.parley/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Load config
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server_port = port;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("parley_server={},tower_http=info", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connection pool: created here, shared through AppState, closed on exit
    let db = storage::init_db(&config.database_url, config.max_connections).await?;
    let repository = Arc::new(SeaOrmChatRepository::new(db.clone()));

    let verifier = Arc::new(TokenVerifier::from_config(&config)?);
    if !config.uploads_enabled() {
        tracing::warn!("imagekit_private_key not set; /api/upload will answer 503");
    }
    let uploads = UploadSigner::from_config(&config).map(Arc::new);

    let limiter = RateLimiter::new(config.rate_limit_per_minute);
    let sweeper = limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweeper.cleanup_expired();
            tracing::trace!(clients = sweeper.tracked_clients(), "Rate limiter swept");
        }
    });

    let config = Arc::new(config);
    let state = AppState {
        config: config.clone(),
        chats: ChatService::new(repository.clone(), repository, config.title_max_chars),
        verifier,
        uploads,
        limiter,
        started_at: Instant::now(),
    };

    let app = routes::create_router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    if let Some(dir) = &config.static_dir {
        tracing::info!("Serving app shell from {}", dir.display());
    }
    tracing::info!("API docs: http://{}/docs", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    storage::close_db(db).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
