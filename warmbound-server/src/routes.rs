// ---------------------------------------------------------------------------
// HTTP routes
// ---------------------------------------------------------------------------
//
// POST /api/research   { domain }  -> ResearchRecord
// POST /api/roi        Params      -> RoiResult
// GET  /api/defaults               -> ConversionRates
// GET  /health                     -> "OK"

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use warmbound_funnel::{compute_roi_with, ConversionRates, EngineConfig, Params, RoiResult};
use warmbound_research::{ResearchProvider, ResearchRecord, ResearchRequest};

use crate::error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ResearchProvider>,
    pub engine: EngineConfig,
}

impl AppState {
    pub fn new(provider: Arc<dyn ResearchProvider>) -> Self {
        Self {
            provider,
            engine: EngineConfig::default(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/research", post(research))
        .route("/api/roi", post(roi))
        .route("/api/defaults", get(defaults))
        .layer(cors)
        .with_state(state)
}

async fn research(
    State(state): State<AppState>,
    payload: Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<ResearchRecord>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let domain = request.validated_domain()?;

    log::info!("research request domain={} provider={}", domain, state.provider.name());
    let record = state.provider.research(&domain).await?;
    Ok(Json(record))
}

async fn roi(
    State(state): State<AppState>,
    payload: Result<Json<Params>, JsonRejection>,
) -> Result<Json<RoiResult>, ApiError> {
    let Json(params) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(Json(compute_roi_with(&params, &state.engine)))
}

async fn defaults() -> Json<ConversionRates> {
    Json(ConversionRates::default())
}
