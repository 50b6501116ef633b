// src/message.rs
use serde::{Deserialize, Serialize};

use crate::services::models::{HealthStatus, ModelInfo, TransactionType};
use crate::services::wizard::ConversationView;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    #[serde(alias = "message")]
    pub answer: String,
}

#[derive(Deserialize)]
pub struct RestartRequest {
    pub session_id: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub conversation: ConversationView,
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub city: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
}

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub backend: Option<HealthStatus>,
    pub backend_error: Option<String>,
    pub model: Option<ModelInfo>,
    pub model_error: Option<String>,
}
