use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    middleware::Actor,
    models::request::RequestResponse,
    repositories::RequestListFilters,
    state::AppState,
    types::RequestId,
    workflow::ActorRole,
};

#[derive(Debug, Deserialize)]
pub struct ApproverQuery {
    #[serde(default = "default_role")]
    pub role: ActorRole,
}

fn default_role() -> ActorRole {
    ActorRole::Manager
}

#[derive(Debug, Deserialize)]
pub struct RejectPayload {
    #[serde(default)]
    pub reason: String,
}

pub async fn list_approvals(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ApproverQuery>,
    Query(filters): Query<RequestListFilters>,
) -> Result<Json<Vec<RequestResponse>>, AppError> {
    if query.role == ActorRole::Employee {
        return Err(AppError::BadRequest(
            "role must be manager or admin".to_string(),
        ));
    }
    let requests = state
        .engine
        .list_for_actor(actor.id, query.role, &filters)
        .await?;
    Ok(Json(requests.into_iter().map(RequestResponse::from).collect()))
}

pub async fn approve_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(request_id): Path<RequestId>,
) -> Result<Json<RequestResponse>, AppError> {
    let request = state.engine.approve(request_id, actor.id).await?;
    Ok(Json(request.into()))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(request_id): Path<RequestId>,
    Json(payload): Json<RejectPayload>,
) -> Result<Json<RequestResponse>, AppError> {
    let request = state
        .engine
        .reject(request_id, actor.id, &payload.reason)
        .await?;
    Ok(Json(request.into()))
}
