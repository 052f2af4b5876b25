use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use bulkrooms_core::domain::contact::ContactMessage;
use bulkrooms_core::routes::Route;
use bulkrooms_core::submission::{ContactRecord, SubmissionContext, SubmissionRecord};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::{client_ip, correlation_id, ApiError, ApiFailure};
use crate::app::AppState;

pub const CONTACT_FAILED: &str =
    "We could not send your message right now. Please try again in a moment.";

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub route: Route,
    pub path: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/contact", post(submit_contact))
}

pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(message): Json<ContactMessage>,
) -> Result<Json<ContactResponse>, ApiFailure> {
    let correlation_id = correlation_id();
    message.validate().map_err(|error| ApiFailure::from_domain(error, &correlation_id))?;

    let context = SubmissionContext::new(state.sheets.contact.clone(), client_ip(&headers));
    let record = SubmissionRecord::Contact(ContactRecord::from_message(&message, &context));

    if let Err(error) = state.dispatcher.dispatch(&record).await {
        warn!(
            event_name = "contact.submission.failed",
            correlation_id = %correlation_id,
            error = %error,
            "contact message could not be delivered"
        );
        return Err(ApiFailure::Error(
            StatusCode::BAD_GATEWAY,
            ApiError {
                error: error.to_string(),
                message: CONTACT_FAILED.to_string(),
                correlation_id,
            },
        ));
    }

    info!(
        event_name = "contact.submission.delivered",
        correlation_id = %correlation_id,
        sheet_name = record.sheet_name(),
        "contact message delivered"
    );
    let route = Route::ContactUsThankYou;
    Ok(Json(ContactResponse { path: route.path(), route }))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
    use bulkrooms_core::domain::contact::ContactMessage;
    use bulkrooms_core::routes::Route;
    use bulkrooms_core::submission::{InMemoryDispatcher, SubmissionRecord};

    use super::{submit_contact, CONTACT_FAILED};
    use crate::api::ApiFailure;
    use crate::app::testing;

    fn message(email: &str) -> ContactMessage {
        ContactMessage {
            name: "Anika".to_string(),
            email: email.to_string(),
            message: "Corporate offsite for 120 people".to_string(),
        }
    }

    #[tokio::test]
    async fn delivers_contact_record_and_points_to_thank_you() {
        let dispatcher = InMemoryDispatcher::default();
        let (state, _dir) = testing::state(dispatcher.clone());

        let Json(response) =
            submit_contact(State(state), HeaderMap::new(), Json(message("anika@example.com")))
                .await
                .expect("delivered");
        assert_eq!(response.route, Route::ContactUsThankYou);
        assert_eq!(response.path, "/contact-us/thank-you");

        let delivered = dispatcher.delivered();
        let SubmissionRecord::Contact(record) = &delivered[0] else {
            panic!("expected a contact record");
        };
        assert_eq!(record.sheet_name, "Contact");
        assert_eq!(record.ip, "unknown");
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_dispatch() {
        let dispatcher = InMemoryDispatcher::default();
        let (state, _dir) = testing::state(dispatcher.clone());

        let failure = submit_contact(State(state), HeaderMap::new(), Json(message("anika@")))
            .await
            .expect_err("invalid email");
        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
        assert!(dispatcher.delivered().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_a_bad_gateway_with_banner() {
        let dispatcher = InMemoryDispatcher::default();
        dispatcher.fail_next(1);
        let (state, _dir) = testing::state(dispatcher);

        let failure =
            submit_contact(State(state), HeaderMap::new(), Json(message("anika@example.com")))
                .await
                .expect_err("transport down");
        match failure {
            ApiFailure::Error(status, body) => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body.message, CONTACT_FAILED);
            }
            ApiFailure::View(..) => panic!("contact failures carry no wizard view"),
        }
    }
}
