pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::{Database, DbInitError};
use crate::services::llm_provider::{ChatApi, LLMProvider};
use crate::state::AppState;

pub fn app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub fn app_with(db: Database, chat: Arc<dyn ChatApi>) -> axum::Router {
    app(AppState::new(db, chat))
}

pub async fn create_app() -> Result<axum::Router, DbInitError> {
    let config = Config::from_env();
    let db = Database::connect(&config.database_url).await?;
    seed::seed_words(&db).await;

    let chat: Arc<dyn ChatApi> = Arc::new(LLMProvider::from_env());
    Ok(app_with(db, chat))
}
