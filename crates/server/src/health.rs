use std::fs;
use std::path::Path;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub sessions: HealthCheck,
    pub counters: HealthCheck,
    pub checked_at: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let counters = counters_check(state.counters.path());
    let ready = counters.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "bulkrooms-server runtime initialized".to_string(),
        },
        sessions: HealthCheck {
            status: "ready",
            detail: format!("{} active wizard sessions", state.sessions.len()),
        },
        counters,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

/// The counters file must be writable for flushes to succeed.
fn counters_check(path: &Path) -> HealthCheck {
    let directory = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };

    match fs::metadata(directory) {
        Ok(metadata) if metadata.permissions().readonly() => HealthCheck {
            status: "degraded",
            detail: format!("counters directory `{}` is read-only", directory.display()),
        },
        Ok(_) => HealthCheck {
            status: "ready",
            detail: format!("counters persist to `{}`", path.display()),
        },
        Err(_) => HealthCheck {
            status: "ready",
            detail: format!(
                "counters directory `{}` will be created on flush",
                directory.display()
            ),
        },
    }
}
