//! HTTP API for the chess bracket server.
//!
//! # Modules
//!
//! - [`competitors`]: registry (register, list, delete, CSV import)
//! - [`tournaments`]: tournaments, draw, match listing, champion
//! - [`matches`]: scheduling and result recording
//! - [`error`]: error to status mapping
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health                          - Health check
//! POST   /api/competidores                - Register competitor
//! GET    /api/competidores                - List (?periodo=&dias_semana=)
//! DELETE /api/competidores/{id}           - Delete unused competitor
//! POST   /api/importar                    - CSV import (raw body)
//! POST   /api/torneios                    - Create tournament
//! GET    /api/torneios                    - List tournaments, newest first
//! GET    /api/torneios/{id}               - Get tournament
//! POST   /api/torneios/{id}/sorteio       - Draw (?seed=&force=)
//! GET    /api/torneios/{id}/partidas      - List matches
//! GET    /api/torneios/{id}/campeao       - Champion
//! PATCH  /api/partidas/{id}               - Update match / record winner
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cb_server::api::{AppState, create_router};
//! use chess_bracket::{BracketManager, db::MemoryStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(BracketManager::new(Arc::new(MemoryStore::new())), None);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively; the API has no authentication and is
//! meant for a school network.

pub mod competitors;
pub mod error;
pub mod matches;
pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, patch, post},
};
use chess_bracket::BracketManager;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: BracketManager,
    /// Present with the postgres backend, probed by the health check
    pub pool: Option<Arc<PgPool>>,
}

impl AppState {
    pub fn new(manager: BracketManager, pool: Option<PgPool>) -> Self {
        Self {
            manager,
            pool: pool.map(Arc::new),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/competidores",
            post(competitors::create_competitor).get(competitors::list_competitors),
        )
        .route(
            "/competidores/{competitor_id}",
            delete(competitors::delete_competitor),
        )
        .route("/importar", post(competitors::import_competitors))
        .route(
            "/torneios",
            post(tournaments::create_tournament).get(tournaments::list_tournaments),
        )
        .route("/torneios/{tournament_id}", get(tournaments::get_tournament))
        .route(
            "/torneios/{tournament_id}/sorteio",
            post(tournaments::draw_tournament),
        )
        .route(
            "/torneios/{tournament_id}/partidas",
            get(tournaments::list_matches),
        )
        .route(
            "/torneios/{tournament_id}/campeao",
            get(tournaments::get_champion),
        )
        .route("/partidas/{match_id}", patch(matches::update_match))
}

/// Health check endpoint for monitoring.
///
/// Returns `200 OK` when storage answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:5000/health
/// # {"status":"healthy","version":"1.0.0","storage":"postgres","database":true,...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, db_healthy) = match &state.pool {
        Some(pool) => (
            "postgres",
            sqlx::query("SELECT 1").fetch_one(&**pool).await.is_ok(),
        ),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
