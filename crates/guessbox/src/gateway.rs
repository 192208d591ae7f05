//! HTTP and WebSocket gateway.
//!
//! | Method | Path                        | Purpose                      |
//! |--------|-----------------------------|------------------------------|
//! | POST   | `/api/v1/rooms`             | create a password room       |
//! | GET    | `/api/v1/rooms`             | list active room ids         |
//! | GET    | `/api/v1/rooms/{room}/ws`   | join a room over WebSocket   |
//! | GET    | `/health`                   | liveness                     |
//!
//! Joining reads the credentials from headers: `Room-Password`
//! (required), `Room-Admin: true` (optional), and `Room-Player`
//! (optional; a random id is assigned when absent).

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use guessbox_protocol::{CreateRoomRequest, Player, RoomId};
use guessbox_room::{Hub, RoomError, anonymous_player};
use guessbox_transport::WebSocketConnection;
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// The hub every gateway handler shares.
pub type SharedHub = Arc<Hub<WebSocketConnection>>;

// Header names are case-insensitive; stored lowercase.
pub const ROOM_PASSWORD_HEADER: &str = "room-password";
pub const ROOM_ADMIN_HEADER: &str = "room-admin";
pub const ROOM_PLAYER_HEADER: &str = "room-player";

/// Builds the gateway's routes around `hub`.
pub fn router(hub: SharedHub) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/rooms", get(list_rooms).post(create_room))
        .route("/api/v1/rooms/{room}/ws", get(join_room))
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_rooms(State(hub): State<SharedHub>) -> Json<Vec<RoomId>> {
    Json(hub.list_room_ids())
}

async fn create_room(
    State(hub): State<SharedHub>,
    body: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if req.room.is_empty() {
        return Err(ApiError::bad_request("room not specified"));
    }
    if req.password.is_empty() {
        return Err(ApiError::bad_request("password not specified"));
    }
    hub.create_room(req.room, &req.password).await?;
    Ok(StatusCode::CREATED)
}

/// Admission: authorize first, then upgrade. Nothing is registered
/// unless both succeed.
async fn join_room(
    State(hub): State<SharedHub>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    if room_id.is_empty() {
        return Err(ApiError::bad_request("room not specified"));
    }
    let password = header(&headers, ROOM_PASSWORD_HEADER)
        .ok_or_else(|| ApiError::bad_request("password not specified"))?;
    let is_admin = header(&headers, ROOM_ADMIN_HEADER) == Some("true");
    let player = match header(&headers, ROOM_PLAYER_HEADER) {
        Some(id) => Player::new(id, is_admin),
        None => anonymous_player(is_admin),
    };

    let room = hub.authorize(&room_id, password).await?;
    let upgrade =
        upgrade.map_err(|e| RoomError::UpgradeFailed(e.body_text()))?;

    Ok(upgrade
        .on_failed_upgrade(|e| {
            tracing::warn!(error = %e, "websocket upgrade failed");
        })
        .on_upgrade(move |socket| async move {
            let conn = WebSocketConnection::new(socket);
            if let Err(e) = hub.serve(room, conn, player).await {
                tracing::info!(error = %e, "admission aborted after upgrade");
            }
        }))
}

/// A non-empty, valid UTF-8 header value.
fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// JSON error body: `{"error": {"code": .., "message": ..}}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

/// An HTTP-facing failure.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::NotFound(_) => Self::not_found("room not found"),
            RoomError::InvalidPassword(_) => {
                Self::unauthorized("invalid password")
            }
            RoomError::AlreadyExists(_) => {
                Self::bad_request("room already exists")
            }
            RoomError::UpgradeFailed(reason) => {
                tracing::warn!(%reason, "upgrade rejected");
                Self::internal("upgrade connection failed")
            }
            RoomError::Secret(reason) => {
                tracing::error!(%reason, "room secret failure");
                Self::internal("internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}
