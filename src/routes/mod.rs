// src/routes/mod.rs
pub mod chat;
pub mod stats;

use crate::{error::AppError, state::SharedState};
use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use chat::{
    chat_handler, delete_conversation_handler, get_conversation_handler, get_metrics_handler,
    restart_handler, start_handler,
};
use stats::{stats_handler, status_handler};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: SharedState) -> Router {
    let admin_routes = Router::new()
        .route("/metrics", get(get_metrics_handler))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/start", post(start_handler))
        .route("/chat/restart", post(restart_handler))
        .route(
            "/chat/{id}",
            get(get_conversation_handler).delete(delete_conversation_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/status", get(status_handler))
        .nest("/admin", admin_routes)
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn auth_middleware(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match (state.config.admin_key.as_deref(), req.headers().get("x-admin-key")) {
        (Some(key), Some(val)) if val == key => Ok(next.run(req).await),
        _ => Err(AppError::Unauthorized("invalid or missing admin key".to_string())),
    }
}
