//! Server-rendered pages.
//!
//! - `GET /get-quote`              start a session and redirect to it
//! - `GET /get-quote/{id}`         current wizard step
//! - `GET /thank-you`              quote confirmation
//! - `GET /contact-us/thank-you`   contact confirmation

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use bulkrooms_core::routes::Route;
use bulkrooms_core::wizard::{view, SessionId, WizardState};
use chrono::Utc;
use tera::{Context, Tera};
use tracing::{error, warn};

use crate::api::{client_ip, correlation_id};
use crate::app::AppState;
use crate::wizard::spawn_geolocation;

const TEMPLATE_GLOB: &str = "templates/pages/**/*.html";
const NOT_FOUND_PAGE: &str =
    "<h1>Quote request not found</h1><p><a href=\"/get-quote\">Start a new request</a></p>";

type PageResult = Result<Html<String>, (StatusCode, Html<String>)>;

/// Templates from disk when present, otherwise the copies compiled into the
/// binary.
pub fn init_templates() -> Arc<Tera> {
    let tera = match Tera::new(TEMPLATE_GLOB) {
        Ok(tera) if tera.get_template_names().next().is_some() => tera,
        Ok(_) => embedded_templates(),
        Err(e) => {
            warn!(
                error = %e,
                "failed to load page templates from filesystem, using embedded copies"
            );
            embedded_templates()
        }
    };
    Arc::new(tera)
}

fn embedded_templates() -> Tera {
    let mut tera = Tera::default();
    let result = tera.add_raw_templates(vec![
        ("base.html", include_str!("../../../templates/pages/base.html")),
        ("wizard.html", include_str!("../../../templates/pages/wizard.html")),
        ("thank_you.html", include_str!("../../../templates/pages/thank_you.html")),
        (
            "contact_thank_you.html",
            include_str!("../../../templates/pages/contact_thank_you.html"),
        ),
    ]);
    if let Err(e) = result {
        error!(error = %e, "embedded page templates failed to compile");
    }
    tera
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/get-quote", get(start_quote))
        .route("/get-quote/{id}", get(wizard_page))
        .route("/thank-you", get(quote_thank_you))
        .route("/contact-us/thank-you", get(contact_thank_you))
}

pub async fn start_quote(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    let id = state.sessions.create();
    spawn_geolocation(&state, &id, client_ip(&headers), &correlation_id());
    Redirect::to(&Route::QuoteWizard { session_id: id }.path())
}

pub async fn wizard_page(Path(raw_id): Path<String>, State(state): State<AppState>) -> Response {
    let today = Utc::now().date_naive();
    let view = raw_id
        .parse::<SessionId>()
        .ok()
        .and_then(|id| state.sessions.with_session(&id, |session| view::render(session, today)));

    let Some(view) = view else {
        return (
            StatusCode::NOT_FOUND,
            Html(NOT_FOUND_PAGE.to_string()),
        )
            .into_response();
    };
    if view.state == WizardState::Confirmed {
        return Redirect::to(&view.route.path()).into_response();
    }

    let mut context = Context::new();
    context.insert("page_title", "Get a Quote");
    context.insert("view", &view);
    render_page(&state.templates, "wizard.html", &context).into_response()
}

pub async fn quote_thank_you(State(state): State<AppState>) -> PageResult {
    let mut context = Context::new();
    context.insert("page_title", "Thank You");
    context.insert("counters", &state.counters.snapshot());
    render_page(&state.templates, "thank_you.html", &context)
}

pub async fn contact_thank_you(State(state): State<AppState>) -> PageResult {
    let mut context = Context::new();
    context.insert("page_title", "Message Sent");
    render_page(&state.templates, "contact_thank_you.html", &context)
}

fn render_page(templates: &Tera, name: &str, context: &Context) -> PageResult {
    templates.render(name, context).map(Html).map_err(|e| {
        error!(
            event_name = "pages.render_failed",
            template = name,
            error = %e,
            "page render failed"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Something went wrong</h1>".to_string()))
    })
}
