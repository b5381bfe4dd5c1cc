mod health;
mod learning;
mod story;
mod translate;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(health::service_banner))
        .route(
            "/api/session",
            get(learning::get_session).fallback(fallback_handler),
        )
        .route(
            "/api/progress",
            post(learning::update_progress).fallback(fallback_handler),
        )
        .route(
            "/api/progress/:user_id",
            get(learning::user_progress).fallback(fallback_handler),
        )
        .route(
            "/api/story",
            post(story::generate_story).fallback(fallback_handler),
        )
        .route(
            "/api/translate/:word",
            get(translate::translate).fallback(fallback_handler),
        );

    for path in ["/health", "/api/health"] {
        app = app.nest(path, health::router());
    }

    app.fallback(fallback_handler).with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "接口不存在").into_response()
}
