//! WebSocket upgrade handler for group chat connections.
//!
//! Handles the HTTP → WebSocket upgrade and hands the socket to the hub:
//! 1. Parse the room id from the path
//! 2. Verify the credential (Bearer header or `?token=`)
//! 3. Verify room membership
//! 4. Upgrade to WebSocket
//! 5. Serve the connection until it dies
//!
//! Every rejection happens before the upgrade, so a rejected client never
//! reaches the group registry.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::StreamExt;
use serde::Deserialize;

use crate::domain::foundation::{AuthError, AuthenticatedUser, ErrorCode, RoomId};
use crate::hub::{ChatHub, Connection};
use crate::ports::{IdentityVerifier, MembershipChecker};

// ════════════════════════════════════════════════════════════════════════════════
// WebSocket State
// ════════════════════════════════════════════════════════════════════════════════

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: ChatHub,
    pub identity: Arc<dyn IdentityVerifier>,
    pub membership: Arc<dyn MembershipChecker>,
}

impl WebSocketState {
    pub fn new(
        hub: ChatHub,
        identity: Arc<dyn IdentityVerifier>,
        membership: Arc<dyn MembershipChecker>,
    ) -> Self {
        Self {
            hub,
            identity,
            membership,
        }
    }
}

/// Query parameters for WebSocket connection.
///
/// Browsers cannot set headers on a WebSocket handshake, so the token may
/// come in the query string instead.
#[derive(Debug, Default, Deserialize)]
pub struct WsConnectParams {
    pub token: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Handshake
// ════════════════════════════════════════════════════════════════════════════════

/// Why a handshake was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeRejection {
    InvalidRoomId,
    MissingCredential,
    InvalidCredential,
    CredentialExpired,
    AuthUnavailable,
    NotAMember,
    GroupNotFound,
    MembershipLookupFailed,
}

impl HandshakeRejection {
    fn status_and_message(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            Self::InvalidRoomId => (StatusCode::BAD_REQUEST, "INVALID_ROOM_ID", "Invalid room ID"),
            Self::MissingCredential => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Authentication required",
            ),
            Self::InvalidCredential => (StatusCode::UNAUTHORIZED, "AUTH_ERROR", "Invalid token"),
            Self::CredentialExpired => (StatusCode::UNAUTHORIZED, "AUTH_ERROR", "Token expired"),
            Self::AuthUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AUTH_ERROR",
                "Authentication service unavailable",
            ),
            Self::NotAMember => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "User is not a member of this group",
            ),
            Self::GroupNotFound => (StatusCode::NOT_FOUND, "GROUP_NOT_FOUND", "Group not found"),
            Self::MembershipLookupFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            ),
        }
    }
}

impl From<AuthError> for HandshakeRejection {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingCredential => Self::MissingCredential,
            AuthError::InvalidToken => Self::InvalidCredential,
            AuthError::TokenExpired => Self::CredentialExpired,
            AuthError::ServiceUnavailable(msg) => {
                tracing::error!("Auth service unavailable: {}", msg);
                Self::AuthUnavailable
            }
        }
    }
}

impl IntoResponse for HandshakeRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = self.status_and_message();
        (
            status,
            Json(serde_json::json!({
                "error": message,
                "code": code
            })),
        )
            .into_response()
    }
}

/// Pick the credential: `Authorization: Bearer` wins over `?token=`.
fn extract_credential<'a>(headers: &'a HeaderMap, params: &'a WsConnectParams) -> Option<&'a str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .or(params.token.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify identity then membership.
///
/// Returns the user and room the connection will be bound to.
pub async fn authorize_handshake(
    state: &WebSocketState,
    raw_room_id: &str,
    headers: &HeaderMap,
    params: &WsConnectParams,
) -> Result<(AuthenticatedUser, RoomId), HandshakeRejection> {
    let room_id: RoomId = raw_room_id
        .parse()
        .map_err(|_| HandshakeRejection::InvalidRoomId)?;

    let credential =
        extract_credential(headers, params).ok_or(HandshakeRejection::MissingCredential)?;
    let user = state.identity.verify_identity(credential).await?;

    match state.membership.is_member(&user.id, room_id).await {
        Ok(true) => Ok((user, room_id)),
        Ok(false) => {
            tracing::info!(user_id = %user.id, room_id = %room_id, "Rejected non-member");
            Err(HandshakeRejection::NotAMember)
        }
        Err(e) if e.code() == ErrorCode::GroupNotFound => Err(HandshakeRejection::GroupNotFound),
        Err(e) => {
            tracing::error!(user_id = %user.id, room_id = %room_id, error = %e, "Membership check failed");
            Err(HandshakeRejection::MembershipLookupFailed)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// WebSocket Upgrade Handler
// ════════════════════════════════════════════════════════════════════════════════

/// Handle WebSocket upgrade requests for a group chat.
///
/// Route: `GET /ws/groups/:room_id`
///
/// # Security
/// - Validates the credential before upgrade
/// - Verifies the user belongs to the group
/// - Rejects with 400/401/403/404/503 before the upgrade
pub async fn ws_handler(
    State(state): State<WebSocketState>,
    Path(room_id): Path<String>,
    Query(params): Query<WsConnectParams>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let (user, room_id) = match authorize_handshake(&state, &room_id, &headers, &params).await {
        Ok(admitted) => admitted,
        Err(rejection) => return rejection.into_response(),
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, user, room_id, state.hub))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, user: AuthenticatedUser, room_id: RoomId, hub: ChatHub) {
    let (sink, stream) = socket.split();
    let conn = Connection::new(user, room_id, sink);
    hub.serve(conn, stream).await;
}

/// Router exposing the chat WebSocket endpoint.
pub fn websocket_router(state: WebSocketState) -> Router {
    Router::new()
        .route("/ws/groups/:room_id", get(ws_handler))
        .with_state(state)
}
