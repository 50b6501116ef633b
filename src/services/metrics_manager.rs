use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::PredictionRequest;

#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsData {
    pub estimations_by_transaction: HashMap<String, u64>,
    pub estimations_by_city: HashMap<String, u64>,
    pub predictions_succeeded: u64,
    pub predictions_failed: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    pub async fn record_request(&self, request: &PredictionRequest) {
        let mut data = self.inner.write().await;
        *data
            .estimations_by_transaction
            .entry(request.transaction_type.to_string())
            .or_insert(0) += 1;
        *data
            .estimations_by_city
            .entry(request.city.clone())
            .or_insert(0) += 1;
    }

    pub async fn record_outcome(&self, succeeded: bool) {
        let mut data = self.inner.write().await;
        if succeeded {
            data.predictions_succeeded += 1;
        } else {
            data.predictions_failed += 1;
        }
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}
