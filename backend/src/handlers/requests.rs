use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    middleware::Actor,
    models::{
        audit_log::TransitionRecord,
        request::{NewRequest, RequestResponse, SelfServiceRequest},
    },
    repositories::RequestListFilters,
    state::AppState,
    types::RequestId,
    workflow::ActorRole,
};

pub async fn submit_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<NewRequest>,
) -> Result<(StatusCode, Json<RequestResponse>), AppError> {
    let request = state.engine.submit(actor.id, payload).await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

pub async fn get_my_requests(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filters): Query<RequestListFilters>,
) -> Result<Json<Vec<RequestResponse>>, AppError> {
    let requests = state
        .engine
        .list_for_actor(actor.id, ActorRole::Employee, &filters)
        .await?;
    Ok(Json(requests.into_iter().map(RequestResponse::from).collect()))
}

pub async fn get_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(request_id): Path<RequestId>,
) -> Result<Json<RequestResponse>, AppError> {
    let request = visible_request(&state, actor, request_id).await?;
    Ok(Json(request.into()))
}

pub async fn get_request_audit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(request_id): Path<RequestId>,
) -> Result<Json<Vec<TransitionRecord>>, AppError> {
    visible_request(&state, actor, request_id).await?;
    let trail = state.engine.audit_trail(request_id).await?;
    Ok(Json(trail))
}

pub async fn cancel_request(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(request_id): Path<RequestId>,
) -> Result<Json<RequestResponse>, AppError> {
    let request = state.engine.cancel(request_id, actor.id).await?;
    Ok(Json(request.into()))
}

async fn visible_request(
    state: &AppState,
    actor: Actor,
    request_id: RequestId,
) -> Result<SelfServiceRequest, AppError> {
    let request = state.engine.get(request_id).await?;
    if !state.engine.can_view(&request, actor.id).await? {
        return Err(AppError::Forbidden(
            "not allowed to view this request".to_string(),
        ));
    }
    Ok(request)
}
