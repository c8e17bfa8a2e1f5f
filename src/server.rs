//! Inbound HTTP surface.
//!
//! Routes, error mapping, and the serve loop with graceful shutdown.

use crate::definition::{MockRequestDto, MockResponseDto};
use crate::error::Error;
use crate::replay::RemoteResponse;
use crate::service::MockService;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use http::header::{HeaderMap, CONNECTION, TRANSFER_ENCODING};
use http::StatusCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Build the application router.
pub fn app_router(service: Arc<MockService>) -> Router {
    Router::new()
        // The serve prefix keeps no static siblings; any registered id
        // stays routable.
        .route("/api/mock/:mock_id", get(serve_mock))
        .route("/api/definitions/response", post(register_response))
        .route("/api/definitions/response/:mock_id", delete(delete_response))
        .route("/api/definitions/request", post(register_request))
        .route("/api/definitions/request/:mock_id", delete(delete_request))
        .route("/api/replay", post(replay_submitted))
        .route("/api/replay/:mock_id", post(replay_stored))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serve the router until the shutdown channel fires, then drain
/// in-flight requests.
pub async fn serve(
    listener: TcpListener,
    service: Arc<MockService>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let app = app_router(service);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            // A dropped sender ends the serve loop like a real signal.
            let _ = shutdown.changed().await;
        })
        .await
}

async fn serve_mock(
    State(service): State<Arc<MockService>>,
    Path(mock_id): Path<String>,
) -> Response {
    match service.serve_mock(&mock_id).await {
        Ok(response) => wire_response(response.status, response.headers, response.body),
        Err(err) => error_response(err),
    }
}

async fn register_response(
    State(service): State<Arc<MockService>>,
    Json(dto): Json<MockResponseDto>,
) -> Response {
    match service.register_response(dto).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_response(
    State(service): State<Arc<MockService>>,
    Path(mock_id): Path<String>,
) -> Response {
    match service.delete_response(&mock_id).await {
        Ok(()) => deletion_confirmed(),
        Err(err) => error_response(err),
    }
}

async fn register_request(
    State(service): State<Arc<MockService>>,
    Json(dto): Json<MockRequestDto>,
) -> Response {
    match service.register_request(dto).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_request(
    State(service): State<Arc<MockService>>,
    Path(mock_id): Path<String>,
) -> Response {
    match service.delete_request(&mock_id).await {
        Ok(()) => deletion_confirmed(),
        Err(err) => error_response(err),
    }
}

async fn replay_submitted(
    State(service): State<Arc<MockService>>,
    Json(dto): Json<MockRequestDto>,
) -> Response {
    match service.replay_request(dto).await {
        Ok(remote) => relay_response(remote),
        Err(err) => error_response(err),
    }
}

async fn replay_stored(
    State(service): State<Arc<MockService>>,
    Path(mock_id): Path<String>,
) -> Response {
    match service.replay_by_id(&mock_id).await {
        Ok(remote) => relay_response(remote),
        Err(err) => error_response(err),
    }
}

async fn health(State(service): State<Arc<MockService>>) -> Response {
    let report = service.report();
    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "ok", "counters": report})),
    )
        .into_response()
}

fn deletion_confirmed() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({"message": "Deletion successful"})),
    )
        .into_response()
}

/// Relay a remote response verbatim. Hop-by-hop headers do not survive
/// the relay; the body was already collected.
fn relay_response(remote: RemoteResponse) -> Response {
    let status = StatusCode::from_u16(remote.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut headers = HeaderMap::new();
    for (name, value) in remote.headers.iter() {
        if name == &TRANSFER_ENCODING || name == &CONNECTION {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    wire_response(status, headers, remote.body)
}

/// Build a response with exactly the given parts, with none of the
/// default headers a body type would otherwise contribute.
fn wire_response(status: StatusCode, headers: HeaderMap, body: bytes::Bytes) -> Response {
    let mut response = Response::new(axum::body::Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Map a service error onto the wire: taxonomy status plus a JSON body.
fn error_response(err: Error) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    }
    (status, Json(serde_json::json!({"error": err.to_string()}))).into_response()
}
