//! JSON handlers for scenario management.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use scenario_app::ports::{
    DeviceStateReader, EngineMetrics, MetricsExposition, ScenarioListRepository,
};
use scenario_domain::id::{DispatchId, ScenarioId};
use scenario_domain::scenario::{Scenario, ScenarioDraft};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of the list endpoint.
#[derive(Debug, Serialize)]
pub struct ScenarioList {
    pub scenarios: Vec<Scenario>,
    pub count: usize,
}

/// Body of the delete and trigger endpoints.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch_id: Option<DispatchId>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<ScenarioList>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get, update, enable and disable endpoints.
pub enum GetResponse {
    Ok(Json<Scenario>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Scenario>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    Deleted,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Deleted => Json(StatusBody {
                status: "deleted",
                message: None,
                dispatch_id: None,
            })
            .into_response(),
        }
    }
}

/// Possible responses from the trigger endpoint.
pub enum TriggerResponse {
    Accepted(DispatchId),
}

impl IntoResponse for TriggerResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Accepted(dispatch_id) => (
                StatusCode::ACCEPTED,
                Json(StatusBody {
                    status: "triggered",
                    message: Some("Scenario execution started"),
                    dispatch_id: Some(dispatch_id),
                }),
            )
                .into_response(),
        }
    }
}

fn parse_id(raw: &str) -> Result<ScenarioId, ApiError> {
    ScenarioId::from_str(raw).map_err(|_| ApiError::unknown_scenario(raw))
}

/// `POST /scenarios` — create a new scenario.
pub async fn create<R, S, M>(
    State(state): State<AppState<R, S, M>>,
    Json(draft): Json<ScenarioDraft>,
) -> Result<CreateResponse, ApiError>
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    let created = state.store.create(draft).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `GET /scenarios/{owner_id}` — list an owner's scenarios.
pub async fn list<R, S, M>(
    State(state): State<AppState<R, S, M>>,
    Path(owner_id): Path<String>,
) -> ListResponse
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    let scenarios = state.store.list_for_owner(&owner_id).await;
    let count = scenarios.len();
    ListResponse::Ok(Json(ScenarioList { scenarios, count }))
}

/// `GET /scenarios/{owner_id}/{id}` — get one scenario.
pub async fn get<R, S, M>(
    State(state): State<AppState<R, S, M>>,
    Path((owner_id, id)): Path<(String, String)>,
) -> Result<GetResponse, ApiError>
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    let id = parse_id(&id)?;
    let scenario = state.store.get(&owner_id, id).await?;
    Ok(GetResponse::Ok(Json(scenario)))
}

/// `PUT /scenarios/{owner_id}/{id}` — replace a scenario.
pub async fn update<R, S, M>(
    State(state): State<AppState<R, S, M>>,
    Path((owner_id, id)): Path<(String, String)>,
    Json(draft): Json<ScenarioDraft>,
) -> Result<GetResponse, ApiError>
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    let id = parse_id(&id)?;
    let updated = state.store.update(&owner_id, id, draft).await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /scenarios/{owner_id}/{id}` — delete a scenario.
pub async fn delete<R, S, M>(
    State(state): State<AppState<R, S, M>>,
    Path((owner_id, id)): Path<(String, String)>,
) -> Result<DeleteResponse, ApiError>
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    let id = parse_id(&id)?;
    state.store.delete(&owner_id, id).await?;
    Ok(DeleteResponse::Deleted)
}

/// `POST /scenarios/{owner_id}/{id}/enable`
pub async fn enable<R, S, M>(
    State(state): State<AppState<R, S, M>>,
    Path((owner_id, id)): Path<(String, String)>,
) -> Result<GetResponse, ApiError>
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    let id = parse_id(&id)?;
    let scenario = state.store.set_enabled(&owner_id, id, true).await?;
    Ok(GetResponse::Ok(Json(scenario)))
}

/// `POST /scenarios/{owner_id}/{id}/disable`
pub async fn disable<R, S, M>(
    State(state): State<AppState<R, S, M>>,
    Path((owner_id, id)): Path<(String, String)>,
) -> Result<GetResponse, ApiError>
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    let id = parse_id(&id)?;
    let scenario = state.store.set_enabled(&owner_id, id, false).await?;
    Ok(GetResponse::Ok(Json(scenario)))
}

/// `POST /scenarios/{owner_id}/{id}/trigger` — run a scenario's actions now.
///
/// Answers as soon as the dispatch is queued.
pub async fn trigger<R, S, M>(
    State(state): State<AppState<R, S, M>>,
    Path((owner_id, id)): Path<(String, String)>,
) -> Result<TriggerResponse, ApiError>
where
    R: ScenarioListRepository + Send + Sync + 'static,
    S: DeviceStateReader + 'static,
    M: EngineMetrics + MetricsExposition + 'static,
{
    let id = parse_id(&id)?;
    let dispatch_id = state.evaluator.trigger_manually(&owner_id, id).await?;
    Ok(TriggerResponse::Accepted(dispatch_id))
}
