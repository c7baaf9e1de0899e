use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use speakup_shared::constants::{LEGACY_SOS_PATH, SOS_PATH};
use speakup_shared::{AlertPayload, SosResponse};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::error::ServerError;

/// SOS bodies are a handful of contacts plus a timestamp.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(SOS_PATH, post(send_sos))
        .route(LEGACY_SOS_PATH, post(send_sos))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    email_configured: bool,
    max_contacts: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        email_configured: state.dispatcher.is_configured(),
        max_contacts: state.config.max_contacts,
    })
}

async fn send_sos(
    State(state): State<AppState>,
    body: Result<Json<AlertPayload>, JsonRejection>,
) -> Result<Json<SosResponse>, ServerError> {
    let Json(payload) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let alert_id = Uuid::new_v4();
    let span = tracing::info_span!("sos", %alert_id);
    span.in_scope(|| {
        info!(
            contacts = payload.contacts.len(),
            has_location = payload.location.is_some(),
            "SOS request received"
        )
    });

    let result = state.dispatcher.dispatch(&payload).instrument(span).await?;
    Ok(Json(SosResponse::from_result(result)))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::dispatch::tests::{contacts, FakeMailer};
    use crate::mailer::Mailer;

    fn router(mailer: Option<Arc<FakeMailer>>) -> Router {
        let config = ServerConfig::default();
        let dispatcher = Dispatcher::new(
            mailer.map(|m| m as Arc<dyn Mailer>),
            config.email_from.clone(),
            config.max_contacts,
        );
        build_router(AppState {
            dispatcher: Arc::new(dispatcher),
            config: Arc::new(config),
        })
    }

    async fn post_json(app: Router, uri: &str, body: String) -> (StatusCode, Option<String>, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, content_type, serde_json::from_slice(&bytes).unwrap())
    }

    fn sos_body(n: usize, location: Value) -> String {
        json!({
            "contacts": contacts(n),
            "location": location,
            "timestamp": "Monday, January 1, 2024 at 09:00:00 AM EST",
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_sos_success() {
        let mailer = Arc::new(FakeMailer::default());
        let (status, content_type, body) = post_json(
            router(Some(mailer.clone())),
            "/sos",
            sos_body(1, json!({ "lat": 40.0, "lng": -73.0 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("application/json"));
        assert_eq!(
            body,
            json!({
                "success": true,
                "message": "SOS alerts sent to 1 contact(s)",
                "successful": 1,
                "failed": 0,
            })
        );
        assert_eq!(mailer.sent_to(), ["c0@example.com"]);
    }

    #[tokio::test]
    async fn test_sos_partial_failure_is_200() {
        let mailer = Arc::new(FakeMailer::failing(&["c1@example.com"]));
        let (status, _, body) =
            post_json(router(Some(mailer)), "/sos", sos_body(3, Value::Null)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["successful"], 2);
        assert_eq!(body["failed"], 1);
    }

    #[tokio::test]
    async fn test_legacy_path() {
        let mailer = Arc::new(FakeMailer::default());
        let (status, _, _) =
            post_json(router(Some(mailer)), "/api/send-sos", sos_body(2, Value::Null)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_no_contacts_is_400() {
        let mailer = Arc::new(FakeMailer::default());
        let (status, _, body) =
            post_json(router(Some(mailer)), "/sos", sos_body(0, Value::Null)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No contacts provided" }));
    }

    #[tokio::test]
    async fn test_missing_contacts_field_is_400() {
        let mailer = Arc::new(FakeMailer::default());
        let (status, _, body) = post_json(
            router(Some(mailer)),
            "/sos",
            json!({ "timestamp": "now" }).to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No contacts provided");
    }

    #[tokio::test]
    async fn test_unconfigured_is_500() {
        let (status, _, body) = post_json(router(None), "/sos", sos_body(1, Value::Null)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Email service not configured" }));
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let (status, content_type, body) =
            post_json(router(None), "/sos", "{not json".to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(content_type.unwrap().starts_with("application/json"));
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = router(None).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["email_configured"], false);
        assert_eq!(body["max_contacts"], 50);
    }
}
