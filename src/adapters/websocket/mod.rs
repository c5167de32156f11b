//! WebSocket adapter for group chat.
//!
//! ```text
//! GET /ws/groups/:room_id
//!        │
//!        ▼
//!  authorize_handshake ── IdentityVerifier ── MembershipChecker
//!        │                     (401/503)          (403/404/500)
//!        ▼
//!   on_upgrade ─▶ Connection::new(write half) ─▶ ChatHub::serve(read half)
//! ```

mod handler;

pub use handler::{
    authorize_handshake, websocket_router, ws_handler, HandshakeRejection, WebSocketState,
    WsConnectParams,
};
