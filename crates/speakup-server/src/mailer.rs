//! Outbound email delivery.
//!
//! [`Mailer`] is the seam the dispatcher fans out over; [`ResendMailer`]
//! talks to a Resend-compatible HTTP API (`POST` JSON with a bearer key).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Email provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// One message to one recipient, in the provider's wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

pub struct ResendMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self, MailError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "email accepted by provider");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            from: "SpeakUp Emergency <sos@example.org>".into(),
            to: "alex@example.com".into(),
            subject: "🚨 EMERGENCY SOS ALERT".into(),
            html: "<p>help</p>".into(),
            text: "help".into(),
        }
    }

    fn mailer(server: &MockServer) -> ResendMailer {
        ResendMailer::new(
            format!("{}/emails", server.uri()),
            "re_test".into(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_posts_json_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(serde_json::json!({
                "to": "alex@example.com",
                "subject": "🚨 EMERGENCY SOS ALERT",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "1" })))
            .expect(1)
            .mount(&server)
            .await;

        mailer(&server).send(&email()).await.unwrap();
    }

    #[tokio::test]
    async fn test_provider_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid `to` field"))
            .mount(&server)
            .await;

        let err = mailer(&server).send(&email()).await.unwrap_err();
        match err {
            MailError::Rejected { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("invalid"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
