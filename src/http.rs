//! HTTP ingress for a [`Consumer`]. Requires the `http` feature.
//!
//! ## Routes
//!
//! - `POST /frames`: body is a [`Frame`]; it is resolved and consumed.
//! - `POST /resolve`: body is a [`Frame`]; returns the resolved target only.
//! - `GET /health`: `{ "ok": true, "handlers": [...] }`.
//!
//! ```ignore
//! let app = http::router(Arc::new(consumer));
//! http::serve(consumer, "0.0.0.0:3000").await?;
//! ```

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::debug;

use crate::consumer::Consumer;
use crate::frame::Frame;

/// Build an axum `Router` that feeds frames into `consumer`.
pub fn router(consumer: Arc<Consumer>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/frames", post(frame_handler))
        .route("/resolve", post(resolve_handler))
        .with_state(consumer)
}

/// Serve `consumer` over HTTP at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve(consumer: Arc<Consumer>, addr: &str) -> Result<(), std::io::Error> {
    let app = router(consumer);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health_handler(State(consumer): State<Arc<Consumer>>) -> impl IntoResponse {
    let mut handlers = consumer.handlers();
    handlers.sort_unstable();
    Json(json!({ "ok": true, "handlers": handlers }))
}

async fn frame_handler(
    State(consumer): State<Arc<Consumer>>,
    Json(frame): Json<Frame>,
) -> Response {
    debug!(routing_key = %frame.routing_key, "frame received over http");
    match consumer.consume(&frame) {
        Ok(outcome) => {
            let fan_out: Vec<_> = outcome
                .fan_out
                .iter()
                .map(|report| {
                    let failed: Vec<&str> =
                        report.failed().into_iter().map(|h| h.as_str()).collect();
                    json!({ "group": report.group, "member": report.member, "failed": failed })
                })
                .collect();
            let body = json!({
                "routingKey": outcome.target.routing_key,
                "route": outcome.target.route,
                "delivery": outcome.target.delivery,
                "response": outcome.response,
                "fanOut": fan_out,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(e.status_code(), e.to_string()),
    }
}

async fn resolve_handler(
    State(consumer): State<Arc<Consumer>>,
    Json(frame): Json<Frame>,
) -> Response {
    match consumer.on_frame_received(&frame) {
        Ok(target) => {
            let body = json!({
                "routingKey": target.routing_key,
                "body": target.body,
                "route": target.route,
                "delivery": target.delivery,
                "category": target.category,
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(e.status_code(), e.to_string()),
    }
}

fn error_response(status: u16, message: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": message }))).into_response()
}
