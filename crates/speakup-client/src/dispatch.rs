//! Client for the notification dispatch service.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use speakup_shared::constants::{ERR_SEND_FAILED, SOS_PATH};
use speakup_shared::{AlertPayload, DispatchResult, ErrorBody, SosResponse};
use tracing::{debug, warn};

use crate::error::DispatchError;

#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(&self, payload: &AlertPayload) -> Result<DispatchResult, DispatchError>;
}

/// Posts the alert to `<server_url>/sos`.
///
/// No client-side timeout is applied; the transport's own limits decide
/// when an unreachable server gives up.
pub struct HttpDispatcher {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpDispatcher {
    pub fn new(server_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}{}", server_url.trim_end_matches('/'), SOS_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AlertDispatcher for HttpDispatcher {
    async fn dispatch(&self, payload: &AlertPayload) -> Result<DispatchResult, DispatchError> {
        debug!(contacts = payload.contacts.len(), endpoint = %self.endpoint, "sending SOS request");

        let resp = self.http.post(&self.endpoint).json(payload).send().await?;
        let status = resp.status();

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        if !is_json {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), bytes = body.len(), "non-JSON response from dispatch service");
            return Err(DispatchError::InvalidResponse {
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| match body.details {
                    Some(details) => format!("{}: {details}", body.error),
                    None => body.error,
                })
                .unwrap_or_else(|_| ERR_SEND_FAILED.to_string());
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: SosResponse =
            serde_json::from_slice(&bytes).map_err(|_| DispatchError::InvalidResponse {
                status: status.as_u16(),
            })?;

        Ok(body.result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use speakup_shared::{EmergencyContact, GeoLocation};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> AlertPayload {
        AlertPayload {
            contacts: vec![EmergencyContact::new("Alex", "alex@example.com").unwrap()],
            location: Some(GeoLocation::new(40.0, -73.0)),
            timestamp: "Monday, January 1, 2024 at 09:00:00 AM EST".into(),
        }
    }

    #[tokio::test]
    async fn test_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sos"))
            .and(body_json(json!({
                "contacts": [{ "name": "Alex", "email": "alex@example.com" }],
                "location": { "lat": 40.0, "lng": -73.0 },
                "timestamp": "Monday, January 1, 2024 at 09:00:00 AM EST",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "SOS alerts sent to 1 contact(s)",
                "successful": 1,
                "failed": 0,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = HttpDispatcher::new(&format!("{}/", server.uri()));
        let result = dispatcher.dispatch(&payload()).await.unwrap();
        assert_eq!(result, DispatchResult::new(1, 0));
    }

    #[tokio::test]
    async fn test_non_json_response_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html>Bad Gateway</html>"),
            )
            .mount(&server)
            .await;

        let err = HttpDispatcher::new(&server.uri()).dispatch(&payload()).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidResponse { status: 200 }));
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "error": "Email service not configured" })),
            )
            .mount(&server)
            .await;

        let err = HttpDispatcher::new(&server.uri()).dispatch(&payload()).await.unwrap_err();
        match err {
            DispatchError::Rejected { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Email service not configured");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_json_with_wrong_shape_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": 1 })))
            .mount(&server)
            .await;

        let err = HttpDispatcher::new(&server.uri()).dispatch(&payload()).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Nothing listens on port 9 (discard) on CI hosts.
        let err = HttpDispatcher::new("http://127.0.0.1:9")
            .dispatch(&payload())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Network(_)));
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(HttpDispatcher::new("http://x/").endpoint(), "http://x/sos");
        assert_eq!(HttpDispatcher::new("http://x").endpoint(), "http://x/sos");
    }
}
