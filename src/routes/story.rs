use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::response::json_error;
use crate::services::story;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    word_ids: Vec<i64>,
    theme: Option<String>,
}

pub async fn generate_story(
    State(state): State<AppState>,
    Json(body): Json<StoryRequest>,
) -> Response {
    let theme = body
        .theme
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| story::DEFAULT_THEME.to_string());

    match story::get_or_generate(state.db(), state.chat(), &body.word_ids, &theme).await {
        Ok(result) => Json(result).into_response(),
        Err(story::StoryError::NoWords) => json_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "未找到对应的单词",
        )
        .into_response(),
        Err(story::StoryError::Db(err)) => {
            tracing::warn!(error = %err, "story generation query failed");
            crate::response::AppError::internal(err.to_string()).into_response()
        }
    }
}
