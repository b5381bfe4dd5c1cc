use std::net::SocketAddr;
use std::sync::Arc;

use voca_backend_rust::config::Config;
use voca_backend_rust::db::Database;
use voca_backend_rust::logging;
use voca_backend_rust::seed;
use voca_backend_rust::services::llm_provider::{ChatApi, LLMProvider};
use voca_backend_rust::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let _log_guard = logging::init_tracing(&config.log_level);

    let db = match Database::connect(&config.database_url).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, "database initialization failed");
            std::process::exit(1);
        }
    };

    seed::seed_words(&db).await;

    let llm = LLMProvider::from_env();
    if !llm.is_available() {
        tracing::warn!("OPENAI_API_KEY not set, story generation will use the fallback path");
    }
    let chat: Arc<dyn ChatApi> = Arc::new(llm);

    let state = AppState::new(db, chat);
    let app = voca_backend_rust::app(state);

    let addr = config.bind_addr();
    tracing::info!(%addr, "voca backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("HTTP server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
