use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::services::translation;
use crate::state::AppState;

pub async fn translate(State(state): State<AppState>, Path(word): Path<String>) -> Response {
    match translation::translate_word(state.db(), state.chat(), &word).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "translate lookup failed");
            crate::response::AppError::internal(err.to_string()).into_response()
        }
    }
}
