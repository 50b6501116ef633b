#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use immo_chatbot::config::Config;
use immo_chatbot::error::GatewayError;
use immo_chatbot::services::gateway::EstimatorGateway;
use immo_chatbot::services::models::{
    AvailableData, CityStats, CityStatsResponse, ConfidenceInterval, HealthStatus, ModelInfo,
    Prediction, PredictionRequest, PredictionResult, QuartierStat, QuartierStatsResponse,
    StatsSummary, TransactionSummary,
};
use immo_chatbot::state::AppState;

/// In-memory backend. A `None` field makes the matching call fail.
#[derive(Default)]
pub struct StubGateway {
    pub options: Option<AvailableData>,
    pub prediction_ok: bool,
    pub summary: Option<StatsSummary>,
    pub city: Option<CityStatsResponse>,
    pub quartiers: Option<QuartierStatsResponse>,
    pub predictions: Mutex<Vec<PredictionRequest>>,
}

impl StubGateway {
    pub fn healthy() -> Self {
        Self {
            options: Some(sample_options()),
            prediction_ok: true,
            summary: Some(sample_summary()),
            city: Some(sample_city_stats()),
            quartiers: Some(sample_quartier_stats()),
            predictions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_predictions() -> Self {
        Self {
            prediction_ok: false,
            ..Self::healthy()
        }
    }

    pub fn recorded(&self) -> Vec<PredictionRequest> {
        self.predictions.lock().unwrap().clone()
    }
}

fn unavailable() -> GatewayError {
    GatewayError::Api {
        status: 503,
        message: "Modèles non chargés".to_string(),
    }
}

#[async_trait]
impl EstimatorGateway for StubGateway {
    async fn available_data(&self) -> Result<AvailableData, GatewayError> {
        self.options.clone().ok_or_else(unavailable)
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, GatewayError> {
        self.predictions.lock().unwrap().push(request.clone());
        if self.prediction_ok {
            Ok(sample_result(request))
        } else {
            Err(unavailable())
        }
    }

    async fn health(&self) -> Result<HealthStatus, GatewayError> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            models_loaded: true,
            timestamp: None,
        })
    }

    async fn model_info(&self) -> Result<ModelInfo, GatewayError> {
        Err(unavailable())
    }

    async fn stats_summary(&self) -> Result<StatsSummary, GatewayError> {
        self.summary.clone().ok_or_else(unavailable)
    }

    async fn city_stats(&self, _city: &str) -> Result<CityStatsResponse, GatewayError> {
        self.city.clone().ok_or_else(unavailable)
    }

    async fn quartier_stats(&self, _city: &str) -> Result<QuartierStatsResponse, GatewayError> {
        self.quartiers.clone().ok_or_else(unavailable)
    }
}

pub fn sample_options() -> AvailableData {
    let mut quartiers = HashMap::new();
    quartiers.insert(
        "Casablanca".to_string(),
        vec!["Maarif".to_string(), "Anfa".to_string()],
    );
    quartiers.insert("Rabat".to_string(), vec!["Agdal".to_string()]);
    AvailableData {
        cities: vec!["Casablanca".to_string(), "Rabat".to_string()],
        quartiers,
    }
}

pub fn sample_result(request: &PredictionRequest) -> PredictionResult {
    let price = 1_250_000.0;
    PredictionResult {
        success: true,
        transaction_type: request.transaction_type,
        prediction: Prediction {
            price_dh: price,
            price_millions: Some(1.25),
            price_per_m2: price / request.surface_m2 as f64,
            price_monthly: None,
            confidence_interval: ConfidenceInterval {
                min: 1_150_000.0,
                max: 1_350_000.0,
                margin: 100_000.0,
            },
        },
        input: request.clone(),
    }
}

pub fn sample_summary() -> StatsSummary {
    StatsSummary {
        cities: vec!["Casablanca".to_string(), "Rabat".to_string()],
        vente: TransactionSummary {
            count: 1200,
            prix_moyen: 1_800_000.0,
            ..Default::default()
        },
        location: TransactionSummary {
            count: 300,
            prix_moyen: 7500.0,
            ..Default::default()
        },
    }
}

pub fn sample_city_stats() -> CityStatsResponse {
    CityStatsResponse {
        vente: Some(CityStats {
            count: 800,
            prix_moyen: 2_100_000.0,
            prix_min: Some(300_000.0),
            prix_max: Some(9_000_000.0),
            prix_m2_moyen: 15_000.0,
            surface_moyenne: 140.0,
        }),
        location: None,
    }
}

pub fn sample_quartier_stats() -> QuartierStatsResponse {
    QuartierStatsResponse {
        vente: vec![
            QuartierStat {
                quartier: "Anfa".to_string(),
                count: 40,
                prix_moyen: 4_000_000.0,
            },
            QuartierStat {
                quartier: "Maarif".to_string(),
                count: 90,
                prix_moyen: 1_900_000.0,
            },
        ],
        location: Vec::new(),
    }
}

pub fn test_config() -> Config {
    Config {
        prediction_delay: Duration::ZERO,
        admin_key: Some("test-admin".to_string()),
        ..Config::default()
    }
}

pub fn app_state(gateway: Arc<StubGateway>) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), gateway))
}

/// The canonical answer sequence for a Casablanca apartment.
pub const SCENARIO: [&str; 7] = ["vente", "Appartement", "Casablanca", "Maarif", "120", "3", "2"];
