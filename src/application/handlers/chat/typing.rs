//! TypingHandler - ephemeral "user is typing" indicator.
//!
//! Nothing is persisted. The event goes to every member, the typist included.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;
use crate::hub::{ChatEventHandler, Connection, EventType, HubError, IncomingEvent};

use super::ChatContext;

/// Inbound payload of `CHAT_TYPING`. A missing payload means "typing".
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default = "default_is_typing")]
    pub is_typing: bool,
}

impl Default for TypingPayload {
    fn default() -> Self {
        Self { is_typing: true }
    }
}

fn default_is_typing() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TypingBroadcast {
    user_id: UserId,
    is_typing: bool,
}

/// Handler for `CHAT_TYPING`.
pub struct TypingHandler {
    ctx: ChatContext,
}

impl TypingHandler {
    pub fn new(ctx: ChatContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ChatEventHandler for TypingHandler {
    async fn handle(&self, event: IncomingEvent, conn: Arc<Connection>) -> Result<(), HubError> {
        let Some(members) = self.ctx.registry.members_of(event.room_id).await else {
            return Ok(());
        };

        let payload: TypingPayload = if event.payload.is_null() {
            TypingPayload::default()
        } else {
            event.decode_payload()?
        };

        let body = serde_json::to_value(TypingBroadcast {
            user_id: conn.user_id().clone(),
            is_typing: payload.is_typing,
        })
        .map_err(|e| HubError::Serialization(e.to_string()))?;

        self.ctx
            .pump
            .broadcast(&members, EventType::ChatTyping, StatusCode::OK, body)
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "TypingHandler"
    }
}
