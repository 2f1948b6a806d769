use axum::http::Method;
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use selfservice_backend::{
    authz::PgAuthorityPolicy,
    config::Config,
    db::connection::{create_pool, run_migrations},
    directory::PgEmployeeDirectory,
    repositories::PgRequestStore,
    routes::api_router,
    state::AppState,
    utils::time::SystemClock,
    workflow::WorkflowEngine,
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "selfservice_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiration_hours = config.jwt_expiration_hours,
        time_zone = %config.time_zone,
        directory_timeout_ms = config.directory_timeout_ms,
        db_max_connections = config.db_max_connections,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    let engine = WorkflowEngine::new(
        Arc::new(PgRequestStore::new(pool.clone())),
        Arc::new(PgEmployeeDirectory::new(pool.clone())),
        Arc::new(PgAuthorityPolicy::new(pool)),
    )
    .with_clock(Arc::new(SystemClock::new(config.time_zone)))
    .with_directory_timeout(config.directory_timeout());

    let addr: SocketAddr = config.bind_addr.parse()?;
    let app = api_router(AppState::new(engine, config)).layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(Any)
                .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
        ),
    );

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
