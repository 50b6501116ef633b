use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse, RestartRequest},
    services::{
        estimation::{schedule_prediction, start_wizard},
        metrics_manager::MetricsData,
        wizard::{Effect, Event},
    },
    state::SharedState,
};

pub async fn start_handler(
    State(state): State<SharedState>,
) -> Result<Json<ChatResponse>, AppError> {
    let session_id = create_session(&state, None).await;
    let conversation = state
        .sessions
        .view(&session_id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;
    Ok(Json(ChatResponse {
        session_id,
        conversation,
    }))
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let answer = payload.answer.trim();
    if answer.is_empty() {
        return Err(AppError::BadRequest("Answer cannot be empty".to_string()));
    }

    let session_id = resolve_session(&state, payload.session_id.as_deref()).await;

    let (outcome, cycle, conversation) = state
        .sessions
        .with_wizard(&session_id, |wizard| {
            let outcome = wizard.handle(Event::Answer(answer.to_string()));
            (outcome, wizard.cycle(), wizard.view())
        })
        .await
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    match outcome {
        Ok(Effect::RequestPrediction(request)) => {
            info!(%session_id, cycle, "answers complete, scheduling estimation");
            let task = schedule_prediction(state.clone(), session_id.clone(), cycle, request);
            state.sessions.set_pending(&session_id, cycle, task).await;
        }
        Ok(Effect::None) => {}
        // surface out of range: the error travels in the view
        Err(err) if err.is_recoverable() => {}
        Err(err) => return Err(err.into()),
    }

    Ok(Json(ChatResponse {
        session_id,
        conversation,
    }))
}

pub async fn restart_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RestartRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let conversation = state
        .sessions
        .restart(&payload.session_id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(payload.session_id.clone()))??;

    info!(session_id = %payload.session_id, "conversation restarted");
    Ok(Json(ChatResponse {
        session_id: payload.session_id,
        conversation,
    }))
}

pub async fn get_conversation_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ChatResponse>, AppError> {
    let conversation = state
        .sessions
        .view(&id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(id.clone()))?;
    Ok(Json(ChatResponse {
        session_id: id,
        conversation,
    }))
}

pub async fn delete_conversation_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove_session(&id).await {
        info!(session_id = %id, "session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::SessionNotFound(id))
    }
}

pub async fn get_metrics_handler(State(state): State<SharedState>) -> Json<MetricsData> {
    Json(state.metrics.get_metrics().await)
}

/// Reuse a live session, or start one (under the requested id when given).
async fn resolve_session(state: &SharedState, requested: Option<&str>) -> String {
    let requested = requested.map(str::trim).filter(|id| !id.is_empty());
    if let Some(id) = requested {
        if state.sessions.contains(id).await {
            return id.to_string();
        }
    }
    create_session(state, requested).await
}

async fn create_session(state: &SharedState, id: Option<&str>) -> String {
    let wizard = start_wizard(state.gateway.as_ref()).await;
    match id {
        Some(id) => state.sessions.insert_session(id, wizard).await,
        None => state.sessions.create_session(wizard).await,
    }
}
