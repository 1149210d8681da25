//! API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ServiceState>`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::engine::board::SharedPriceBoard;
use crate::pricing::PriceOptimizer;
use crate::types::{BatchResult, OptimizeRequest, PriceBoard, PricingError};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServiceState {
    pub optimizer: Arc<PriceOptimizer>,
    pub board: SharedPriceBoard,
    /// Most recent successful on-demand batch.
    pub last_optimization: RwLock<Option<BatchResult>>,
}

impl ServiceState {
    pub fn new(optimizer: Arc<PriceOptimizer>, board: SharedPriceBoard) -> Self {
        Self {
            optimizer,
            board,
            last_optimization: RwLock::new(None),
        }
    }
}

pub type AppState = Arc<ServiceState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error body returned by every failing endpoint: `{ "error": ... }`.
#[derive(Debug)]
pub enum ApiError {
    Pricing(PricingError),
    NotFound(String),
    /// Body that could not be read as the expected JSON. Keeps axum's status.
    BadRequest { status: StatusCode, message: String },
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        ApiError::Pricing(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Pricing(e @ PricingError::Validation(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            ApiError::Pricing(e) => {
                error!(error = %e, "Optimization failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest { status, message } => (status, message),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub board_generation: u64,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/optimize
pub async fn optimize(
    State(state): State<AppState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, ApiError> {
    let Json(request) = payload?;
    info!(products = request.product_names.len(), "Optimization requested");

    let batch = state.optimizer.optimize_request(request)?;
    *state.last_optimization.write().await = Some(batch.clone());

    Ok(Json(batch))
}

/// GET /api/board
pub async fn get_board(State(state): State<AppState>) -> Json<PriceBoard> {
    Json(state.board.latest().as_ref().clone())
}

/// GET /api/last-optimization
pub async fn get_last_optimization(
    State(state): State<AppState>,
) -> Result<Json<BatchResult>, ApiError> {
    state
        .last_optimization
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no optimization has run yet".into()))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        board_generation: state.board.latest().generation,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
