// src/services/estimation.rs
use tracing::{info, warn};

use super::gateway::EstimatorGateway;
use super::models::{AvailableData, PredictionRequest};
use super::pacing::ScheduledTask;
use super::wizard::{Event, Wizard};
use crate::state::SharedState;

pub const OPTIONS_UNAVAILABLE: &str = "Impossible de charger les données. Veuillez réessayer.";

/// Fetch the selectable options for a new conversation and greet the user.
/// A failed fetch leaves the lists empty and raises the persistent banner.
pub async fn start_wizard(gateway: &dyn EstimatorGateway) -> Wizard {
    match gateway.available_data().await {
        Ok(options) => {
            info!(cities = options.cities.len(), "options loaded");
            Wizard::started(options, None)
        }
        Err(err) => {
            warn!(error = %err, "could not load options");
            Wizard::started(AvailableData::default(), Some(OPTIONS_UNAVAILABLE.to_string()))
        }
    }
}

pub async fn request_prediction(
    gateway: &dyn EstimatorGateway,
    request: &PredictionRequest,
) -> Event {
    match gateway.predict(request).await {
        Ok(result) => Event::PredictionSucceeded(result),
        Err(err) => Event::PredictionFailed(err.to_string()),
    }
}

/// Issue the prediction for `cycle` after the pacing delay and hand the
/// outcome back to the session, unless it was torn down or restarted meanwhile.
pub fn schedule_prediction(
    state: SharedState,
    session_id: String,
    cycle: u64,
    request: PredictionRequest,
) -> ScheduledTask {
    let delay = state.config.prediction_delay;
    ScheduledTask::schedule(delay, async move {
        state.metrics.record_request(&request).await;
        let event = request_prediction(state.gateway.as_ref(), &request).await;
        let succeeded = matches!(event, Event::PredictionSucceeded(_));
        state.metrics.record_outcome(succeeded).await;

        if state
            .sessions
            .apply_if_current(&session_id, cycle, event)
            .await
        {
            info!(%session_id, cycle, succeeded, "estimation cycle completed");
        } else {
            info!(%session_id, cycle, "late estimation discarded");
        }
    })
}
