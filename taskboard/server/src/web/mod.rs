use axum::Router;
use axum::routing::get;
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::service::ParentScope;
use crate::storage::{Repository, SeaOrmRepository};

pub mod api;

/// State shared by every API handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub parent_scope: ParentScope,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, parent_scope: ParentScope) -> Self {
        Self { repo, parent_scope }
    }
}

/// Builds the complete application router.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(crate::project::api::create_api_router(state.clone()))
        .merge(crate::column::api::create_api_router(state.clone()))
        .merge(crate::task::api::create_api_router(state.clone()))
        .merge(crate::comment::api::create_api_router(state))
        .route("/health", get(health_check_handler))
        .route("/api-docs/openapi.json", get(api::openapi_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new()),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    tracing::info!("Nested paths use parent scope {:?}", config.parent_scope);
    let state = Arc::new(AppState::new(
        Arc::new(SeaOrmRepository::new(db)),
        config.parent_scope,
    ));

    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
