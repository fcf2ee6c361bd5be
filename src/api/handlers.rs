//! Request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::ApiError;
use crate::models::{Label, SpamModel};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<SpamModel>,
}

/// Body of `POST /predict`. A missing or null `emails` field is an empty batch.
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub emails: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub classes: Vec<Label>,
    pub n_features: usize,
}

/// `POST /predict`: one label per email, in request order.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Vec<Label>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(status = %rejection.status(), "Rejected predict request body");
        ApiError::from(rejection)
    })?;

    let emails = request.emails.unwrap_or_default();
    let count = emails.len();
    let model = Arc::clone(&state.model);

    let result = tokio::task::spawn_blocking(move || model.predict(&emails))
        .await
        .map_err(|e| {
            metrics::counter!("spam_guard_prediction_errors_total").increment(1);
            warn!(error = %e, "Prediction task aborted");
            ApiError::Internal(e.to_string())
        })?;

    match result {
        Ok(labels) => {
            metrics::counter!("spam_guard_predictions_total").increment(count as u64);
            debug!(count, "Predictions served");
            Ok(Json(labels))
        }
        Err(e) => {
            metrics::counter!("spam_guard_prediction_errors_total").increment(1);
            warn!(error = %e, count, "Prediction failed");
            Err(e.into())
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        classes: state.model.classes().to_vec(),
        n_features: state.model.n_features(),
    })
}
