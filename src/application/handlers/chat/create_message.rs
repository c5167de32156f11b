//! CreateMessageHandler - persists a chat message and fans it out to the room.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;

use crate::domain::chat::{MessageView, NewMessage};
use crate::domain::foundation::DomainError;
use crate::hub::{ChatEventHandler, Connection, EventType, HubError, IncomingEvent};

use super::ChatContext;

/// Inbound payload of `CHAT_CREATE_MESSAGE`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessagePayload {
    pub content: String,
}

/// Handler for `CHAT_CREATE_MESSAGE`.
pub struct CreateMessageHandler {
    ctx: ChatContext,
}

impl CreateMessageHandler {
    pub fn new(ctx: ChatContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ChatEventHandler for CreateMessageHandler {
    async fn handle(&self, event: IncomingEvent, conn: Arc<Connection>) -> Result<(), HubError> {
        // 1. Current members; an empty room means we lost a race with teardown
        let Some(_) = self.ctx.registry.members_of(event.room_id).await else {
            return Ok(());
        };

        // 2. Decode
        let payload: CreateMessagePayload = event.decode_payload()?;

        // 3. Validate, stamping the sender from the verified identity
        let new_message = match NewMessage::new(
            event.room_id,
            conn.user_id().clone(),
            payload.content,
            self.ctx.max_message_length,
        ) {
            Ok(message) => message,
            Err(e) => {
                let error = DomainError::from(e);
                return self
                    .ctx
                    .reply_error(&conn, EventType::ChatCreateMessage, &error)
                    .await;
            }
        };

        // 4. Persist
        let message = match self.ctx.history.create_message(new_message).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(
                    room_id = %event.room_id,
                    user_id = %conn.user_id(),
                    error = %e,
                    "Failed to create message"
                );
                return self
                    .ctx
                    .reply_error(&conn, EventType::ChatCreateMessage, &e)
                    .await;
            }
        };

        // 5. Fan out to whoever is in the room now
        let Some(members) = self.ctx.registry.members_of(event.room_id).await else {
            return Ok(());
        };
        let payload = serde_json::to_value(MessageView::from(&message))
            .map_err(|e| HubError::Serialization(e.to_string()))?;
        let sent = self
            .ctx
            .pump
            .broadcast(&members, EventType::ChatCreateMessage, StatusCode::CREATED, payload)
            .await?;

        tracing::debug!(
            room_id = %event.room_id,
            message_id = %message.id,
            recipients = sent,
            "Message created"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "CreateMessageHandler"
    }
}
