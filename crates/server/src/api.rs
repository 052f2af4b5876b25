//! JSON failure bodies shared by the API handlers.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bulkrooms_core::errors::{ApplicationError, DomainError, InterfaceError};
use bulkrooms_core::wizard::{SessionId, StepView};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub enum ApiFailure {
    Error(StatusCode, ApiError),
    /// The wizard moved (or refused to move) and the client needs the new view.
    View(StatusCode, Box<StepView>),
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        match self {
            Self::Error(status, body) => (status, Json(body)).into_response(),
            Self::View(status, view) => (status, Json(*view)).into_response(),
        }
    }
}

impl ApiFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Error(status, _) | Self::View(status, _) => *status,
        }
    }

    pub fn session_not_found(raw_id: &str, correlation_id: &str) -> Self {
        Self::Error(
            StatusCode::NOT_FOUND,
            ApiError {
                error: format!("quote session `{raw_id}` was not found"),
                message: "This quote request has expired. Please start again.".to_string(),
                correlation_id: correlation_id.to_string(),
            },
        )
    }

    pub fn from_domain(error: DomainError, correlation_id: &str) -> Self {
        Self::from_interface(ApplicationError::from(error).into_interface(correlation_id))
    }

    pub fn from_interface(error: InterfaceError) -> Self {
        let status = match error {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::Error(
            status,
            ApiError {
                error: error.to_string(),
                message: error.user_message().to_string(),
                correlation_id: error.correlation_id().to_string(),
            },
        )
    }
}

pub fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn parse_session_id(raw_id: &str, correlation_id: &str) -> Result<SessionId, ApiFailure> {
    raw_id.parse::<SessionId>().map_err(|_| ApiFailure::session_not_found(raw_id, correlation_id))
}

/// Visitor address as reported by the fronting proxy, if any.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next());
    let real_ip = headers.get("x-real-ip").and_then(|value| value.to_str().ok());

    forwarded.or(real_ip).map(str::trim).filter(|ip| !ip.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use bulkrooms_core::errors::DomainError;

    use super::{client_ip, parse_session_id, ApiFailure};

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.1"));
        assert_eq!(client_ip(&headers).as_deref(), Some("198.51.100.1"));

        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.4, 10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.4"));

        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn malformed_session_ids_are_not_found() {
        let failure = parse_session_id("nope", "req-1").expect_err("invalid id");
        assert_eq!(failure.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_fields_are_bad_requests() {
        let failure = ApiFailure::from_domain(
            DomainError::InvalidField {
                field: "adultsFixed".into(),
                reason: "not a number".into(),
            },
            "req-2",
        );
        match failure {
            ApiFailure::Error(status, body) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body.correlation_id, "req-2");
                assert!(body.error.contains("adultsFixed"));
            }
            ApiFailure::View(..) => panic!("expected an error body"),
        }
    }
}
