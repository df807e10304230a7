//! Chess bracket HTTP server.
//!
//! Serves the competitor registry, draws and match updates over a
//! PostgreSQL or in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use cb_server::{
    api,
    config::{ConfigOverrides, ServerConfig, StorageBackend},
    logging, metrics,
};
use chess_bracket::{
    BracketManager,
    db::{Database, MemoryStore},
};
use pico_args::Arguments;

const HELP: &str = "\
Run the chess bracket server

USAGE:
  cb_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:5000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --storage    BACKEND     postgres or memory          [default: env STORAGE_BACKEND or postgres]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:5000)
  DATABASE_URL             PostgreSQL connection string
  STORAGE_BACKEND          postgres | memory
  RUN_MIGRATIONS           Apply migrations on startup (true/false)
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RUST_LOG                 Log filter [default: info,sqlx=warn,hyper=warn]
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    storage: Option<StorageBackend>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        storage: pargs.opt_value_from_str("--storage")?,
    };

    logging::init();

    let config = ServerConfig::from_env(ConfigOverrides {
        bind: args.bind,
        database_url: args.database_url,
        storage: args.storage,
    })?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        tracing::info!("Metrics exporter listening on {}", addr);
    }

    let state = match config.storage {
        StorageBackend::Postgres => {
            let db = Database::new(&config.database)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected successfully");

            if config.run_migrations {
                db.migrate().await.context("Failed to apply migrations")?;
            }

            let manager = BracketManager::new(Arc::new(db.store()));
            api::AppState::new(manager, Some(db.pool().clone()))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on exit");
            api::AppState::new(BracketManager::new(Arc::new(MemoryStore::new())), None)
        }
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "Server is running at http://{} ({} storage). Press Ctrl+C to stop.",
        config.bind,
        config.storage
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
