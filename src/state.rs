// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::gateway::EstimatorGateway;
use crate::services::metrics_manager::MetricsManager;
use crate::services::session_manager::SessionManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub sessions: SessionManager,
    pub metrics: MetricsManager,
    pub gateway: Arc<dyn EstimatorGateway>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn EstimatorGateway>) -> Self {
        Self {
            sessions: SessionManager::new(config.session_ttl),
            metrics: MetricsManager::new(),
            gateway,
            config,
        }
    }
}
