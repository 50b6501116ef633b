use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    error::AppError,
    message::{StatsQuery, StatusResponse},
    services::stats::{MarketView, market_overview},
    state::SharedState,
};

pub async fn stats_handler(
    State(state): State<SharedState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<MarketView>, AppError> {
    let view = market_overview(state.gateway.as_ref(), query.city.as_deref(), query.kind).await?;
    Ok(Json(view))
}

/// Backend health and model details, fetched side by side.
pub async fn status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    let (health, model) = tokio::join!(state.gateway.health(), state.gateway.model_info());

    let (backend, backend_error) = match health {
        Ok(h) => (Some(h), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let (model, model_error) = match model {
        Ok(m) => (Some(m), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Json(StatusResponse {
        backend,
        backend_error,
        model,
        model_error,
    })
}
