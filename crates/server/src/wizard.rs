//! Quote wizard API.
//!
//! - `POST   /api/quote/sessions`                         start a session
//! - `GET    /api/quote/sessions/{id}`                    current step view
//! - `PUT    /api/quote/sessions/{id}/fields`             edit one draft field
//! - `POST   /api/quote/sessions/{id}/locations`          add a location slot
//! - `PUT    /api/quote/sessions/{id}/locations/{index}`  fill a slot from autosuggest
//! - `DELETE /api/quote/sessions/{id}/locations/{index}`  remove a slot
//! - `POST   /api/quote/sessions/{id}/advance`            step 1 -> step 2
//! - `POST   /api/quote/sessions/{id}/back`               step 2 -> step 1
//! - `POST   /api/quote/sessions/{id}/submit`             send the request

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use bulkrooms_core::domain::draft::DraftField;
use bulkrooms_core::errors::DomainError;
use bulkrooms_core::submission::SubmissionContext;
use bulkrooms_core::wizard::{view, SessionId, StepView, WizardSession, WizardTransitionError};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::{client_ip, correlation_id, parse_session_id, ApiFailure};
use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationUpdate {
    #[serde(default)]
    pub value: String,
}

type ViewResult = Result<Json<StepView>, ApiFailure>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/quote/sessions", post(create_session))
        .route("/api/quote/sessions/{id}", get(get_session))
        .route("/api/quote/sessions/{id}/fields", put(update_field))
        .route("/api/quote/sessions/{id}/locations", post(add_location))
        .route(
            "/api/quote/sessions/{id}/locations/{index}",
            put(set_location).delete(remove_location),
        )
        .route("/api/quote/sessions/{id}/advance", post(advance))
        .route("/api/quote/sessions/{id}/back", post(back))
        .route("/api/quote/sessions/{id}/submit", post(submit))
}

fn render(session: &WizardSession) -> StepView {
    view::render(session, Utc::now().date_naive())
}

/// Starts a session and kicks off the visitor's geolocation in the background.
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<StepView>), ApiFailure> {
    let correlation_id = correlation_id();
    let id = state.sessions.create();
    spawn_geolocation(&state, &id, client_ip(&headers), &correlation_id);

    let view = state
        .sessions
        .with_session(&id, |session| render(session))
        .ok_or_else(|| ApiFailure::session_not_found(&id.to_string(), &correlation_id))?;

    info!(
        event_name = "wizard.session.created",
        correlation_id = %correlation_id,
        session_id = %id,
        active_sessions = state.sessions.len(),
        "quote wizard session created"
    );
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) fn spawn_geolocation(
    state: &AppState,
    id: &SessionId,
    client_ip: Option<String>,
    correlation_id: &str,
) {
    let Some(geolocator) = state.geolocator.clone() else {
        return;
    };
    let sessions = state.sessions.clone();
    let id = id.clone();
    let correlation_id = correlation_id.to_string();

    tokio::spawn(async move {
        match geolocator.locate(client_ip.as_deref()).await {
            Ok(geo) => {
                let country_code = geo.country_code.clone().unwrap_or_default();
                sessions.with_session(&id, |session| session.set_geo(geo));
                info!(
                    event_name = "wizard.session.geolocated",
                    correlation_id = %correlation_id,
                    session_id = %id,
                    country_code = %country_code,
                    "visitor geolocation resolved"
                );
            }
            Err(error) => warn!(
                event_name = "wizard.session.geolocation_failed",
                correlation_id = %correlation_id,
                session_id = %id,
                error = %error,
                "visitor geolocation failed; continuing without it"
            ),
        }
    });
}

pub async fn get_session(Path(raw_id): Path<String>, State(state): State<AppState>) -> ViewResult {
    let correlation_id = correlation_id();
    let id = parse_session_id(&raw_id, &correlation_id)?;
    state
        .sessions
        .with_session(&id, |session| Json(render(session)))
        .ok_or_else(|| ApiFailure::session_not_found(&raw_id, &correlation_id))
}

pub async fn update_field(
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<FieldUpdate>,
) -> ViewResult {
    let correlation_id = correlation_id();
    let field = body
        .field
        .parse::<DraftField>()
        .map_err(|error| ApiFailure::from_domain(error, &correlation_id))?;

    mutate(&state, &raw_id, &correlation_id, |session| session.set_field(field, &body.value))
}

pub async fn add_location(Path(raw_id): Path<String>, State(state): State<AppState>) -> ViewResult {
    let correlation_id = correlation_id();
    mutate(&state, &raw_id, &correlation_id, |session| session.add_location().map(|_| ()))
}

pub async fn set_location(
    Path((raw_id, index)): Path<(String, usize)>,
    State(state): State<AppState>,
    Json(body): Json<LocationUpdate>,
) -> ViewResult {
    let correlation_id = correlation_id();
    mutate(&state, &raw_id, &correlation_id, |session| session.set_location(index, &body.value))
}

/// Removing the only slot is a no-op; the view comes back unchanged.
pub async fn remove_location(
    Path((raw_id, index)): Path<(String, usize)>,
    State(state): State<AppState>,
) -> ViewResult {
    let correlation_id = correlation_id();
    mutate(&state, &raw_id, &correlation_id, |session| session.remove_location(index).map(|_| ()))
}

pub async fn advance(Path(raw_id): Path<String>, State(state): State<AppState>) -> ViewResult {
    let correlation_id = correlation_id();
    transition(&state, &raw_id, &correlation_id, "advance", |session| {
        session.advance().map(|_| ())
    })
}

pub async fn back(Path(raw_id): Path<String>, State(state): State<AppState>) -> ViewResult {
    let correlation_id = correlation_id();
    transition(&state, &raw_id, &correlation_id, "back", |session| session.back().map(|_| ()))
}

/// Gate and freeze under the lock, dispatch without it, then settle.
pub async fn submit(
    Path(raw_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ViewResult {
    let correlation_id = correlation_id();
    let id = parse_session_id(&raw_id, &correlation_id)?;
    let context = SubmissionContext::new(state.sheets.quote.clone(), client_ip(&headers));

    let record = state
        .sessions
        .with_session(&id, |session| {
            session.begin_submission(context).map_err(|error| (error, render(session)))
        })
        .ok_or_else(|| ApiFailure::session_not_found(&raw_id, &correlation_id))?
        .map_err(|(error, view)| reject(&id, &correlation_id, "submit", error, view))?;

    info!(
        event_name = "wizard.submission.dispatching",
        correlation_id = %correlation_id,
        session_id = %id,
        sheet_name = record.sheet_name(),
        "dispatching quote request"
    );
    let result = state.dispatcher.dispatch(&record).await;

    let view = state
        .sessions
        .with_session(&id, |session| {
            session.complete_submission(&result).map(|_| render(session))
        })
        .ok_or_else(|| ApiFailure::session_not_found(&raw_id, &correlation_id))?
        .map_err(|error| ApiFailure::from_domain(error, &correlation_id))?;

    match result {
        Ok(()) => {
            let snapshot = state.counters.record_quote_submission();
            let counters = state.counters.clone();
            let flushed = tokio::task::spawn_blocking(move || counters.flush()).await;
            match flushed {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(
                    event_name = "counters.flush_failed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "could not persist counters after submission"
                ),
                Err(error) => warn!(
                    event_name = "counters.flush_failed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "counters flush task did not complete"
                ),
            }
            info!(
                event_name = "wizard.submission.confirmed",
                correlation_id = %correlation_id,
                session_id = %id,
                quotes_submitted = snapshot.quotes_submitted,
                "quote request confirmed"
            );
            Ok(Json(view))
        }
        Err(error) => {
            warn!(
                event_name = "wizard.submission.failed",
                correlation_id = %correlation_id,
                session_id = %id,
                error = %error,
                "quote request could not be delivered"
            );
            Err(ApiFailure::View(StatusCode::BAD_GATEWAY, Box::new(view)))
        }
    }
}

fn mutate(
    state: &AppState,
    raw_id: &str,
    correlation_id: &str,
    edit: impl FnOnce(&mut WizardSession) -> Result<(), DomainError>,
) -> ViewResult {
    let id = parse_session_id(raw_id, correlation_id)?;
    state
        .sessions
        .with_session(&id, |session| edit(session).map(|()| render(session)))
        .ok_or_else(|| ApiFailure::session_not_found(raw_id, correlation_id))?
        .map(Json)
        .map_err(|error| ApiFailure::from_domain(error, correlation_id))
}

fn transition(
    state: &AppState,
    raw_id: &str,
    correlation_id: &str,
    action: &'static str,
    step: impl FnOnce(&mut WizardSession) -> Result<(), DomainError>,
) -> ViewResult {
    let id = parse_session_id(raw_id, correlation_id)?;
    let (result, view) = state
        .sessions
        .with_session(&id, |session| {
            let result = step(session);
            (result, render(session))
        })
        .ok_or_else(|| ApiFailure::session_not_found(raw_id, correlation_id))?;

    match result {
        Ok(()) => {
            info!(
                event_name = "wizard.session.transitioned",
                correlation_id = %correlation_id,
                session_id = %id,
                action,
                step = view.step,
                "wizard step changed"
            );
            Ok(Json(view))
        }
        Err(error) => Err(reject(&id, correlation_id, action, error, view)),
    }
}

/// Gate failures answer 422 with the view so the slot message can be shown.
fn reject(
    id: &SessionId,
    correlation_id: &str,
    action: &'static str,
    error: DomainError,
    view: StepView,
) -> ApiFailure {
    if let DomainError::WizardTransition(WizardTransitionError::GateRejected { message, .. }) =
        &error
    {
        info!(
            event_name = "wizard.gate.rejected",
            correlation_id = %correlation_id,
            session_id = %id,
            action,
            reason = %message,
            "wizard gate rejected the step"
        );
        return ApiFailure::View(StatusCode::UNPROCESSABLE_ENTITY, Box::new(view));
    }
    ApiFailure::from_domain(error, correlation_id)
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, HeaderValue, StatusCode},
        Json,
    };
    use bulkrooms_core::submission::{InMemoryDispatcher, SubmissionRecord};
    use bulkrooms_core::wizard::gate::{ENTER_ROOMS, SELECT_DATE_RANGE};
    use bulkrooms_core::wizard::session::SUBMISSION_FAILED;
    use bulkrooms_core::wizard::{StepView, WizardState};
    use bulkrooms_core::Route;

    use super::*;
    use crate::app::{testing, AppState};

    async fn start(state: &AppState) -> String {
        let (status, Json(view)) =
            create_session(State(state.clone()), HeaderMap::new()).await.expect("create");
        assert_eq!(status, StatusCode::CREATED);
        view.session_id
    }

    async fn set(state: &AppState, id: &str, field: &str, value: &str) -> StepView {
        update_field(
            Path(id.to_string()),
            State(state.clone()),
            Json(FieldUpdate { field: field.to_string(), value: value.to_string() }),
        )
        .await
        .expect("field update")
        .0
    }

    async fn fill_step1(state: &AppState, id: &str) {
        set(state, id, "eventType", "wedding").await;
        set(state, id, "locations[0]", "Jaipur").await;
        set(state, id, "startDate", "2025-12-01").await;
        set(state, id, "endDate", "2025-12-03").await;
    }

    async fn fill_step2(state: &AppState, id: &str) {
        set(state, id, "adultsFixed", "50").await;
        set(state, id, "adultsVariation", "5").await;
        set(state, id, "roomsFixed", "20").await;
        set(state, id, "roomsVariation", "2").await;
        set(state, id, "email", "priya@example.com").await;
    }

    fn view_of(failure: ApiFailure) -> (StatusCode, StepView) {
        match failure {
            ApiFailure::View(status, view) => (status, *view),
            ApiFailure::Error(status, body) => panic!("expected a view, got {status}: {body:?}"),
        }
    }

    #[tokio::test]
    async fn jaipur_wedding_flows_through_to_confirmation() {
        let dispatcher = InMemoryDispatcher::default();
        let (state, _dir) = testing::state(dispatcher.clone());
        let id = start(&state).await;

        fill_step1(&state, &id).await;
        let Json(step2) =
            advance(Path(id.clone()), State(state.clone())).await.expect("advance");
        assert_eq!(step2.step, 2);
        assert_eq!(step2.days_count, Some(2));

        fill_step2(&state, &id).await;
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        let Json(done) =
            submit(Path(id.clone()), State(state.clone()), headers).await.expect("submit");
        assert_eq!(done.state, WizardState::Confirmed);
        assert_eq!(done.route, Route::QuoteThankYou);

        let delivered = dispatcher.delivered();
        assert_eq!(delivered.len(), 1);
        let SubmissionRecord::Quote(record) = &delivered[0] else {
            panic!("expected a quote record");
        };
        assert_eq!(record.adults, "50 ± 5");
        assert_eq!(record.rooms_needed, "20 ± 2");
        assert_eq!(record.start_date, "12/1/2025");
        assert_eq!(record.ip, "203.0.113.9");
        assert_eq!(state.counters.snapshot().quotes_submitted, 1);
        assert!(state.counters.path().exists(), "confirmation persists the counters");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_confirmations_persist_every_count() {
        let (state, _dir) = testing::state(InMemoryDispatcher::default());
        let mut ids = Vec::new();
        for _ in 0..6 {
            let id = start(&state).await;
            fill_step1(&state, &id).await;
            advance(Path(id.clone()), State(state.clone())).await.expect("advance");
            fill_step2(&state, &id).await;
            ids.push(id);
        }

        let submissions: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let state = state.clone();
                tokio::spawn(async move { submit(Path(id), State(state), HeaderMap::new()).await })
            })
            .collect();
        for submission in submissions {
            let Json(view) = submission.await.expect("task").expect("submit");
            assert_eq!(view.state, WizardState::Confirmed);
        }

        let persisted = std::fs::read_to_string(state.counters.path()).expect("counters file");
        let persisted: serde_json::Value = serde_json::from_str(&persisted).expect("json");
        assert_eq!(persisted["quotesSubmitted"], 6);
    }

    #[tokio::test]
    async fn gate_rejection_answers_422_with_slot_message() {
        let (state, _dir) = testing::state(InMemoryDispatcher::default());
        let id = start(&state).await;
        set(&state, &id, "eventType", "trip").await;
        set(&state, &id, "locations[0]", "Manali").await;

        let failure = advance(Path(id.clone()), State(state.clone())).await.expect_err("no dates");
        let (status, view) = view_of(failure);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(view.step, 1);
        assert_eq!(view.errors.get("dates").map(String::as_str), Some(SELECT_DATE_RANGE));
    }

    #[tokio::test]
    async fn transport_failure_keeps_step2_with_banner_then_retry_confirms() {
        let dispatcher = InMemoryDispatcher::default();
        dispatcher.fail_next(1);
        let (state, _dir) = testing::state(dispatcher.clone());
        let id = start(&state).await;
        fill_step1(&state, &id).await;
        advance(Path(id.clone()), State(state.clone())).await.expect("advance");
        fill_step2(&state, &id).await;

        let failure = submit(Path(id.clone()), State(state.clone()), HeaderMap::new())
            .await
            .expect_err("first send fails");
        let (status, view) = view_of(failure);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(view.state, WizardState::SubmissionFailed);
        assert_eq!(view.step, 2);
        assert_eq!(view.banner.as_deref(), Some(SUBMISSION_FAILED));
        assert_eq!(state.counters.snapshot().quotes_submitted, 0);

        let Json(view) = submit(Path(id.clone()), State(state.clone()), HeaderMap::new())
            .await
            .expect("retry succeeds");
        assert_eq!(view.state, WizardState::Confirmed);
        assert_eq!(view.banner, None);
        assert_eq!(dispatcher.delivered().len(), 1);
    }

    #[tokio::test]
    async fn step2_gate_blocks_submit_without_rooms() {
        let (state, _dir) = testing::state(InMemoryDispatcher::default());
        let id = start(&state).await;
        fill_step1(&state, &id).await;
        advance(Path(id.clone()), State(state.clone())).await.expect("advance");
        set(&state, &id, "adultsFixed", "10").await;

        let failure = submit(Path(id.clone()), State(state.clone()), HeaderMap::new())
            .await
            .expect_err("rooms missing");
        let (status, view) = view_of(failure);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(view.state, WizardState::Step2);
        assert_eq!(view.errors.get("rooms").map(String::as_str), Some(ENTER_ROOMS));
    }

    #[tokio::test]
    async fn confirmed_sessions_reject_further_transitions_and_edits() {
        let (state, _dir) = testing::state(InMemoryDispatcher::default());
        let id = start(&state).await;
        fill_step1(&state, &id).await;
        advance(Path(id.clone()), State(state.clone())).await.expect("advance");
        fill_step2(&state, &id).await;
        submit(Path(id.clone()), State(state.clone()), HeaderMap::new()).await.expect("submit");

        let failure = back(Path(id.clone()), State(state.clone())).await.expect_err("terminal");
        assert_eq!(failure.status(), StatusCode::CONFLICT);

        let failure = update_field(
            Path(id.clone()),
            State(state.clone()),
            Json(FieldUpdate { field: "budget".to_string(), value: "lots".to_string() }),
        )
        .await
        .expect_err("frozen");
        assert_eq!(failure.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn location_slots_can_be_added_filled_and_removed() {
        let (state, _dir) = testing::state(InMemoryDispatcher::default());
        let id = start(&state).await;

        let Json(view) = add_location(Path(id.clone()), State(state.clone())).await.expect("add");
        assert!(view.can_remove_location);
        assert!(view.field("locations[1]").is_some());

        let Json(view) = set_location(
            Path((id.clone(), 1)),
            State(state.clone()),
            Json(LocationUpdate { value: "Pushkar, Rajasthan".to_string() }),
        )
        .await
        .expect("set");
        assert_eq!(
            view.field("locations[1]").map(|field| field.value.as_str()),
            Some("Pushkar, Rajasthan")
        );

        let Json(view) =
            remove_location(Path((id.clone(), 0)), State(state.clone())).await.expect("remove");
        assert_eq!(
            view.field("locations[0]").map(|field| field.value.as_str()),
            Some("Pushkar, Rajasthan")
        );

        let Json(view) =
            remove_location(Path((id.clone(), 0)), State(state.clone())).await.expect("no-op");
        assert!(view.field("locations[0]").is_some());
        assert!(!view.can_remove_location);
    }

    #[tokio::test]
    async fn unknown_field_and_session_are_reported() {
        let (state, _dir) = testing::state(InMemoryDispatcher::default());
        let id = start(&state).await;

        let failure = update_field(
            Path(id),
            State(state.clone()),
            Json(FieldUpdate { field: "favouriteColour".to_string(), value: "teal".to_string() }),
        )
        .await
        .expect_err("unknown field");
        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);

        let failure = get_session(Path(SessionId::new().to_string()), State(state))
            .await
            .expect_err("unknown session");
        assert_eq!(failure.status(), StatusCode::NOT_FOUND);
    }
}
