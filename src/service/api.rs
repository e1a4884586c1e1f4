//! JSON HTTP API and Prometheus endpoint
//!
//! Thin axum layer over `LeagueService`. Every handler is a query or a
//! single service call; failures are mapped to status codes by error kind.

use crate::error::LeagueError;
use crate::rating::EngineParameters;
use crate::service::league::LeagueService;
use crate::source::ResultSource;
use crate::types::GameResult;
use crate::utils::format_rating;
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Shared state for the API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<LeagueService>,
    /// Source used by `POST /ingest`, if one is configured
    pub source: Option<Arc<dyn ResultSource>>,
}

/// Error response carrying a `LeagueError` kind
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = LeagueError::kind_of(&self.0);
        let status = match kind {
            "invalid_input" => StatusCode::BAD_REQUEST,
            "source_unavailable" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed ({}): {}", kind, self.0);
        } else {
            warn!("Request rejected ({}): {}", kind, self.0);
        }

        (
            status,
            Json(json!({
                "error": kind,
                "message": self.0.to_string()
            })),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub home: String,
    pub away: String,
}

#[derive(Debug, Deserialize)]
pub struct GamesQuery {
    pub limit: Option<usize>,
}

/// HTTP server for the league API
pub struct ApiServer {
    addr: SocketAddr,
    state: ApiState,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    pub fn new(addr: SocketAddr, state: ApiState) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    /// Serve until `stop` is called
    pub async fn start(&self) -> Result<()> {
        let app = router(self.state.clone());
        let listener = TcpListener::bind(self.addr).await?;

        info!("League API listening on http://{}", self.addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("League API shutdown signal received");
            })
            .await?;

        info!("League API stopped");
        Ok(())
    }

    pub fn stop(&self) {
        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to league API: {}", e);
        }
    }
}

/// Build the router with all league endpoints
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/standings", get(standings_handler))
        .route("/teams/{id}", get(team_handler))
        .route("/predict", get(predict_handler))
        .route("/games", get(games_handler).post(record_game_handler))
        .route("/ingest", post(ingest_handler))
        .route("/summary", get(summary_handler))
        .route("/export", get(export_handler))
        .route(
            "/parameters",
            get(parameters_handler).put(set_parameters_handler),
        )
        .route("/reset", post(reset_handler))
        .with_state(state)
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "league-ratings",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/metrics",
            "/standings",
            "/teams/{id}",
            "/predict?home=&away=",
            "/games",
            "/ingest",
            "/summary",
            "/export",
            "/parameters",
            "/reset"
        ]
    }))
}

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    debug!("Health check requested");
    let summary = state.service.summary().await;

    Json(json!({
        "status": "healthy",
        "service": "league-ratings",
        "version": env!("CARGO_PKG_VERSION"),
        "teams": summary.teams,
        "games_played": summary.games_played
    }))
}

async fn metrics_handler(State(state): State<ApiState>) -> Response {
    match state.service.metrics().encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn standings_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.service.standings().await)
}

async fn team_handler(
    State(state): State<ApiState>,
    Path(team): Path<String>,
) -> impl IntoResponse {
    let rating = state.service.rating_of(&team).await;
    let history = state.service.team_history(&team).await;

    Json(json!({
        "team_id": team,
        "display_name": state.service.display_name(&team).await,
        "rating": rating,
        "rating_display": format_rating(rating),
        "history": history
    }))
}

async fn predict_handler(
    State(state): State<ApiState>,
    Query(query): Query<PredictQuery>,
) -> impl IntoResponse {
    Json(state.service.predict(&query.home, &query.away).await)
}

async fn games_handler(
    State(state): State<ApiState>,
    Query(query): Query<GamesQuery>,
) -> impl IntoResponse {
    let games = match query.limit {
        Some(limit) => state.service.recent_games(limit).await,
        None => state.service.games().await,
    };
    Json(games)
}

async fn record_game_handler(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<GameResult>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(result) = payload.map_err(|rejection| {
        anyhow::Error::from(LeagueError::InvalidInput {
            reason: rejection.body_text(),
        })
    })?;

    let record = state.service.record_game(result).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn ingest_handler(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    let source = state.source.as_ref().ok_or_else(|| {
        anyhow::Error::from(LeagueError::ConfigurationError {
            message: "no result source configured".to_string(),
        })
    })?;

    let report = state.service.ingest(source.as_ref()).await?;
    Ok(Json(report))
}

async fn summary_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.service.summary().await)
}

async fn export_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.service.export().await)
}

async fn parameters_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.service.parameters().await)
}

async fn set_parameters_handler(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<EngineParameters>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(parameters) = payload.map_err(|rejection| {
        anyhow::Error::from(LeagueError::InvalidInput {
            reason: rejection.body_text(),
        })
    })?;

    Ok(Json(state.service.set_parameters(parameters).await?))
}

async fn reset_handler(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    state.service.reset().await?;
    Ok(Json(json!({ "status": "reset" })))
}
