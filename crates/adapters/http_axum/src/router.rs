//! Axum router assembly.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use scenario_app::ports::{
    DeviceStateReader, EngineMetrics, MetricsExposition, ScenarioListRepository,
};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Merges the API routes with `/health` and `/metrics`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<R, S, M>(state: AppState<R, S, M>) -> Router
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics::<R, S, M>))
        .merge(crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn metrics<R, S, M>(State(state): State<AppState<R, S, M>>) -> Response
where
    M: MetricsExposition,
{
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, state.metrics.content_type())], body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
