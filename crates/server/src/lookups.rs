//! Read-only helpers: the location autosuggest proxy and the counters
//! snapshot.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use bulkrooms_core::counters::CounterSnapshot;
use bulkrooms_core::domain::place::PlaceSuggestion;
use bulkrooms_core::wizard::SessionId;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
    pub region: Option<String>,
    pub session: Option<String>,
}

/// `query` echoes the request so clients can drop answers for stale input.
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub query: String,
    pub region: String,
    pub suggestions: Vec<PlaceSuggestion>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/locations/suggest", get(suggest_locations))
        .route("/api/counters", get(counters))
}

/// Lookup failures degrade to an empty list.
pub async fn suggest_locations(
    State(state): State<AppState>,
    Query(params): Query<SuggestQuery>,
) -> Json<SuggestResponse> {
    let query = params.q.trim().to_string();
    let region = resolve_region(&state, &params);

    let suggestions = match (&state.places, query.is_empty()) {
        (Some(places), false) => match places.suggest(&query, &region).await {
            Ok(suggestions) => suggestions,
            Err(error) => {
                warn!(
                    event_name = "lookups.autosuggest.failed",
                    region = %region,
                    error = %error,
                    "location autosuggest failed; returning no suggestions"
                );
                Vec::new()
            }
        },
        _ => Vec::new(),
    };

    Json(SuggestResponse { query, region, suggestions })
}

/// Explicit region, else the session's geolocated country, else the default.
fn resolve_region(state: &AppState, params: &SuggestQuery) -> String {
    if let Some(region) = params.region.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        return region.to_string();
    }

    params
        .session
        .as_deref()
        .and_then(|raw| raw.parse::<SessionId>().ok())
        .and_then(|id| {
            state.sessions.with_session(&id, |session| {
                session.geo().and_then(|geo| geo.country_code.clone())
            })
        })
        .flatten()
        .unwrap_or_else(|| state.default_region.clone())
}

pub async fn counters(State(state): State<AppState>) -> Json<CounterSnapshot> {
    Json(state.counters.snapshot())
}
