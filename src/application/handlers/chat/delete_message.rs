//! DeleteMessageHandler - soft-deletes the sender's own message.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, MessageId, UserId};
use crate::hub::{ChatEventHandler, Connection, EventType, HubError, IncomingEvent};

use super::ChatContext;

/// Inbound payload of `CHAT_DELETE_MESSAGE`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessagePayload {
    pub message_id: MessageId,
}

/// Broadcast payload. Never carries the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeletedPayload {
    pub message_id: MessageId,
    pub deleted_by: UserId,
}

/// Handler for `CHAT_DELETE_MESSAGE`.
pub struct DeleteMessageHandler {
    ctx: ChatContext,
}

impl DeleteMessageHandler {
    pub fn new(ctx: ChatContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ChatEventHandler for DeleteMessageHandler {
    async fn handle(&self, event: IncomingEvent, conn: Arc<Connection>) -> Result<(), HubError> {
        let Some(_) = self.ctx.registry.members_of(event.room_id).await else {
            return Ok(());
        };

        let payload: DeleteMessagePayload = event.decode_payload()?;
        let deleted_by = conn.user_id().clone();

        let affected = match self
            .ctx
            .history
            .delete_message(payload.message_id, event.room_id, &deleted_by)
            .await
        {
            Ok(affected) => affected,
            Err(e) => {
                tracing::error!(
                    room_id = %event.room_id,
                    message_id = %payload.message_id,
                    error = %e,
                    "Failed to delete message"
                );
                return self
                    .ctx
                    .reply_error(&conn, EventType::ChatDeleteMessage, &e)
                    .await;
            }
        };

        if affected == 0 {
            let error = DomainError::new(
                ErrorCode::MessageNotFound,
                format!("Message {} not found", payload.message_id),
            );
            return self
                .ctx
                .reply_error(&conn, EventType::ChatDeleteMessage, &error)
                .await;
        }

        let Some(members) = self.ctx.registry.members_of(event.room_id).await else {
            return Ok(());
        };
        let body = MessageDeletedPayload {
            message_id: payload.message_id,
            deleted_by,
        };
        let body = serde_json::to_value(body).map_err(|e| HubError::Serialization(e.to_string()))?;
        self.ctx
            .pump
            .broadcast(&members, EventType::ChatDeleteMessage, StatusCode::OK, body)
            .await?;

        tracing::debug!(
            room_id = %event.room_id,
            message_id = %payload.message_id,
            "Message deleted"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DeleteMessageHandler"
    }
}
