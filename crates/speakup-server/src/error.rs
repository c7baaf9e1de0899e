use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use speakup_shared::constants::{ERR_NO_CONTACTS, ERR_SEND_FAILED, ERR_SERVICE_NOT_CONFIGURED};
use speakup_shared::ErrorBody;
use thiserror::Error;

/// Request-level failures. Per-recipient delivery failures never appear
/// here; they are counted in the dispatch result.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("No contacts provided")]
    NoContacts,

    #[error("Email service not configured")]
    ServiceUnavailable,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServerError::NoContacts => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: ERR_NO_CONTACTS.to_string(),
                    details: None,
                },
            ),
            ServerError::ServiceUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: ERR_SERVICE_NOT_CONFIGURED.to_string(),
                    details: None,
                },
            ),
            ServerError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: self.to_string(),
                    details: None,
                },
            ),
            ServerError::Internal(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: ERR_SEND_FAILED.to_string(),
                    details: Some(details.clone()),
                },
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn render(err: ServerError) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_internal_error_carries_details() {
        let (status, body) = render(ServerError::Internal("task 7 panicked".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to send SOS alerts");
        assert_eq!(body["details"], "task 7 panicked");
    }

    #[tokio::test]
    async fn test_client_errors_have_no_details() {
        let (status, body) = render(ServerError::NoContacts).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No contacts provided");
        assert!(body.get("details").is_none());
    }
}
