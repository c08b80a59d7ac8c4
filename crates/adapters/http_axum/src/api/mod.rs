//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod evaluate;
#[allow(clippy::missing_errors_doc)]
pub mod scenarios;

use axum::Router;
use axum::routing::{get, post};

use scenario_app::ports::{
    DeviceStateReader, EngineMetrics, MetricsExposition, ScenarioListRepository,
};

use crate::state::AppState;

/// Build the API sub-router.
pub fn routes<R, S, M>() -> Router<AppState<R, S, M>>
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    Router::new()
        .route("/evaluate", post(evaluate::evaluate::<R, S, M>))
        .route("/scenarios", post(scenarios::create::<R, S, M>))
        .route("/scenarios/{owner_id}", get(scenarios::list::<R, S, M>))
        .route(
            "/scenarios/{owner_id}/{id}",
            get(scenarios::get::<R, S, M>)
                .put(scenarios::update::<R, S, M>)
                .delete(scenarios::delete::<R, S, M>),
        )
        .route(
            "/scenarios/{owner_id}/{id}/enable",
            post(scenarios::enable::<R, S, M>),
        )
        .route(
            "/scenarios/{owner_id}/{id}/disable",
            post(scenarios::disable::<R, S, M>),
        )
        .route(
            "/scenarios/{owner_id}/{id}/trigger",
            post(scenarios::trigger::<R, S, M>),
        )
}
