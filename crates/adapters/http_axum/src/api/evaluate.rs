//! `POST /evaluate` — entry point of the event pipeline.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use scenario_app::evaluator::EvaluationOutcome;
use scenario_app::ports::{
    DeviceStateReader, EngineMetrics, MetricsExposition, ScenarioListRepository,
};
use scenario_domain::event::DeviceEvent;

use crate::error::ApiError;
use crate::state::AppState;

/// Summary of one evaluation.
#[derive(Debug, Serialize)]
pub struct EvaluateBody {
    pub evaluated_count: usize,
    pub triggered_count: usize,
    pub event_id: String,
    pub duplicate: bool,
}

impl From<EvaluationOutcome> for EvaluateBody {
    fn from(outcome: EvaluationOutcome) -> Self {
        Self {
            evaluated_count: outcome.evaluated_count,
            triggered_count: outcome.triggered_count,
            event_id: outcome.event_id,
            duplicate: outcome.duplicate,
        }
    }
}

/// Possible responses from the evaluate endpoint.
pub enum EvaluateResponse {
    Ok(Json<EvaluateBody>),
}

impl IntoResponse for EvaluateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /evaluate` — match an event against its owner's scenarios.
///
/// Answers once every firing scenario has been queued; actions run later.
pub async fn evaluate<R, S, M>(
    State(state): State<AppState<R, S, M>>,
    Json(event): Json<DeviceEvent>,
) -> Result<EvaluateResponse, ApiError>
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    let outcome = state.evaluator.evaluate(event).await?;
    Ok(EvaluateResponse::Ok(Json(outcome.into())))
}
