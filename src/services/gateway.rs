// src/services/gateway.rs
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::models::{
    AvailableData, CityStatsResponse, HealthStatus, ModelInfo, PredictionRequest,
    PredictionResult, QuartierStatsResponse, StatsSummary,
};
use crate::error::GatewayError;

/// Boundary to the estimation backend. Every call is a single attempt and
/// failures are returned unchanged.
#[async_trait]
pub trait EstimatorGateway: Send + Sync {
    async fn available_data(&self) -> Result<AvailableData, GatewayError>;

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, GatewayError>;

    async fn health(&self) -> Result<HealthStatus, GatewayError>;

    async fn model_info(&self) -> Result<ModelInfo, GatewayError>;

    async fn stats_summary(&self) -> Result<StatsSummary, GatewayError>;

    async fn city_stats(&self, city: &str) -> Result<CityStatsResponse, GatewayError>;

    async fn quartier_stats(&self, city: &str) -> Result<QuartierStatsResponse, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// An empty `base_url` keeps request paths unqualified.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        decode(path, response).await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = api_error_message(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "unknown error".to_string());
        warn!(path, status = status.as_u16(), %message, "backend error");
        return Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        });
    }
    response.json::<T>().await.map_err(GatewayError::Decode)
}

/// Extracts the backend's `{"error": "..."}` message, or the raw body.
fn api_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value
            .get("error")
            .and_then(|e| e.as_str())
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}

#[async_trait]
impl EstimatorGateway for HttpGateway {
    async fn available_data(&self) -> Result<AvailableData, GatewayError> {
        self.get_json("/data").await
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, GatewayError> {
        debug!(
            city = %request.city,
            quartier = %request.quartier,
            transaction = %request.transaction_type,
            "POST /predict"
        );
        let response = self
            .client
            .post(self.url("/predict"))
            .json(request)
            .send()
            .await?;
        decode("/predict", response).await
    }

    async fn health(&self) -> Result<HealthStatus, GatewayError> {
        self.get_json("/health").await
    }

    async fn model_info(&self) -> Result<ModelInfo, GatewayError> {
        self.get_json("/model-info").await
    }

    async fn stats_summary(&self) -> Result<StatsSummary, GatewayError> {
        self.get_json("/stats/summary").await
    }

    async fn city_stats(&self, city: &str) -> Result<CityStatsResponse, GatewayError> {
        self.get_json(&format!("/stats/city/{}", urlencoding::encode(city)))
            .await
    }

    async fn quartier_stats(&self, city: &str) -> Result<QuartierStatsResponse, GatewayError> {
        self.get_json(&format!("/stats/quartiers/{}", urlencoding::encode(city)))
            .await
    }
}
