//! Recipebox server
//!
//! Serves the recipe catalog, accounts and favorites over HTTP, backed by a
//! SQLite database.
//!
//! # Configuration
//!
//! Read from `~/.config/recipebox/config.yaml` (or `--config`), then
//! environment variables:
//! - `RECIPEBOX_PORT`: Port to listen on (default: 5000)
//! - `RECIPEBOX_DATABASE_PATH`: SQLite database file
//! - `RECIPEBOX_TOKEN_EXPIRY_MINUTES`: Session token lifetime (default: 60)
//!
//! Logging is controlled with `RUST_LOG`.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recipebox::config::Config;
use recipebox::db::init_db;
use recipebox::server::{router, AppState, TokenStore};

/// How often expired session tokens are swept.
const TOKEN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "recipebox-server")]
#[command(version)]
#[command(about = "Recipebox HTTP server")]
struct Cli {
    /// Path to config file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recipebox=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    tracing::info!("Database: {}", config.database_path.display());
    let pool = init_db(&config.database_path)
        .await
        .map_err(|e| format!("Failed to open database: {}", e))?;

    let tokens = Arc::new(TokenStore::new(config.token_expiry_minutes));
    spawn_token_sweeper(tokens.clone());

    let app = router(AppState::new(pool, tokens));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_token_sweeper(tokens: Arc<TokenStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = tokens.cleanup_expired();
            if removed > 0 {
                tracing::debug!("Swept {} expired token(s)", removed);
            }
        }
    });
}
