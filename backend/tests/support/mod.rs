#![allow(dead_code)]
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc};
use tower::ServiceExt;

use selfservice_backend::{
    authz::StaticAuthority,
    config::Config,
    directory::StaticDirectory,
    repositories::InMemoryRequestStore,
    routes::api_router,
    state::AppState,
    types::UserId,
    utils::{jwt::create_access_token, time::ManualClock},
    workflow::WorkflowEngine,
};

pub const TEST_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://127.0.0.1:5432/selfservice_test".into(),
        jwt_secret: TEST_SECRET.into(),
        jwt_expiration_hours: 1,
        time_zone: chrono_tz::UTC,
        directory_timeout_ms: 500,
        bind_addr: "127.0.0.1:0".into(),
        db_max_connections: 5,
    }
}

/// Connects to `TEST_DATABASE_URL` and runs migrations. Returns `None` when
/// the variable is unset so database tests can be skipped locally.
pub async fn test_pool() -> Option<PgPool> {
    let url = env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    Some(pool)
}

/// Organization used by most tests: a manager M with report E, an employee
/// without a manager, and an admin A.
pub struct Org {
    pub directory: Arc<StaticDirectory>,
    pub authority: Arc<StaticAuthority>,
    pub clock: Arc<ManualClock>,
    pub manager: UserId,
    pub employee: UserId,
    pub loner: UserId,
    pub admin: UserId,
}

impl Org {
    pub async fn new() -> Self {
        let directory = Arc::new(StaticDirectory::new());
        let manager = directory.add_employee(None).await;
        let employee = directory.add_employee(Some(manager)).await;
        let loner = directory.add_employee(None).await;
        let admin = directory.add_employee(None).await;
        let authority = Arc::new(StaticAuthority::with_admins([admin]));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 26, 8, 30, 0).unwrap(),
        ));
        Self {
            directory,
            authority,
            clock,
            manager,
            employee,
            loner,
            admin,
        }
    }

    pub fn engine(&self) -> WorkflowEngine {
        WorkflowEngine::new(
            Arc::new(InMemoryRequestStore::new()),
            self.directory.clone(),
            self.authority.clone(),
        )
        .with_clock(self.clock.clone())
    }

    pub fn app(&self) -> Router {
        api_router(AppState::new(self.engine(), test_config()))
    }
}

pub fn token_for(user_id: UserId) -> String {
    create_access_token(user_id, TEST_SECRET, 1).expect("create token")
}

pub fn json_request(method: &str, uri: &str, user_id: UserId, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token_for(user_id)));
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    }
}

pub async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("call app");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}
