use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/info", get(info))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

/// `GET /`: static service banner, kept for clients probing the API root.
pub async fn service_banner() -> Response {
    let response = ServiceBanner {
        name: "Voca 语刻",
        status: "running",
        version: app_version(),
        docs: "/health/info",
    };
    Json(response).into_response()
}

async fn root(State(state): State<AppState>) -> Response {
    let db = state.db().health().await;

    let response = CompatHealthResponse {
        status: if db.healthy { "ok" } else { "degraded" },
        database: if db.healthy {
            "connected"
        } else {
            "disconnected"
        },
        timestamp: now_iso(),
    };

    let status_code = if db.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn info(State(state): State<AppState>) -> Response {
    let response = HealthInfoResponse {
        service: "voca-backend",
        version: app_version(),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
    };

    Json(response).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    let response = LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
    };

    Json(response).into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    let db = state.db().health().await;

    let status = if db.healthy { "healthy" } else { "unhealthy" };
    let response = ReadinessResponse {
        status,
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
        checks: ReadinessChecks {
            database: if db.healthy {
                "connected"
            } else if db.error.as_deref() == Some("timeout") {
                "timeout"
            } else {
                "disconnected"
            },
        },
        database_latency: db.latency_ms,
    };

    let status_code = if db.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response)).into_response()
}

fn app_version() -> String {
    std::env::var("APP_VERSION")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
}

fn system_time_iso(time: std::time::SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[derive(Serialize)]
struct ServiceBanner {
    name: &'static str,
    status: &'static str,
    version: String,
    docs: &'static str,
}

#[derive(Serialize)]
struct CompatHealthResponse {
    status: &'static str,
    database: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: String,
    start_time: String,
    uptime: u64,
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    checks: ReadinessChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_latency: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessChecks {
    database: &'static str,
}
