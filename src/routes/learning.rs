use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::response::json_error;
use crate::services::{progress, session};
use crate::state::AppState;

const DEFAULT_SESSION_COUNT: usize = 10;
const MAX_SESSION_COUNT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    user_id: String,
    level: Option<String>,
    count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressUpdateRequest {
    user_id: String,
    word_id: i64,
    correct: bool,
}

pub async fn get_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Response {
    let level = query.level.as_deref().unwrap_or(session::LEVEL_WILDCARD);
    let count = query.count.unwrap_or(DEFAULT_SESSION_COUNT);

    if count == 0 || count > MAX_SESSION_COUNT {
        return json_error(
            StatusCode::BAD_REQUEST,
            "BAD_REQUEST",
            "count 必须在 1 到 100 之间",
        )
        .into_response();
    }

    match session::build_session(state.db(), &query.user_id, level, count).await {
        Ok(words) => Json(words).into_response(),
        Err(session::SessionError::NoWords(level)) => json_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("未找到 {level} 级别的单词"),
        )
        .into_response(),
        Err(session::SessionError::Db(err)) => {
            tracing::warn!(error = %err, "session query failed");
            crate::response::AppError::internal(err.to_string()).into_response()
        }
    }
}

pub async fn update_progress(
    State(state): State<AppState>,
    Json(body): Json<ProgressUpdateRequest>,
) -> Response {
    match progress::record_answer(state.db(), &body.user_id, body.word_id, body.correct).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, word_id = body.word_id, "progress update failed");
            crate::response::AppError::internal(err.to_string()).into_response()
        }
    }
}

pub async fn user_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    match progress::user_overview(state.db(), &user_id).await {
        Ok(overview) => Json(overview).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "progress overview query failed");
            crate::response::AppError::internal(err.to_string()).into_response()
        }
    }
}
