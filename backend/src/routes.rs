use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware, state::AppState};

/// All `/api` routes. Every route requires a bearer token.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/requests", post(handlers::requests::submit_request))
        .route("/api/requests/me", get(handlers::requests::get_my_requests))
        .route(
            "/api/requests/{id}",
            get(handlers::requests::get_request).delete(handlers::requests::cancel_request),
        )
        .route(
            "/api/requests/{id}/audit",
            get(handlers::requests::get_request_audit),
        )
        .route("/api/approvals", get(handlers::approvals::list_approvals))
        .route(
            "/api/approvals/{id}/approve",
            put(handlers::approvals::approve_request),
        )
        .route(
            "/api/approvals/{id}/reject",
            put(handlers::approvals::reject_request),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ))
        .layer(axum_middleware::from_fn(middleware::log_error_responses))
        .with_state(state)
}
