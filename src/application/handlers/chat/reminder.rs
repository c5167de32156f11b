//! Reminder handlers - thin re-broadcasts of a client-supplied object.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde_json::{Map, Value};

use crate::hub::{ChatEventHandler, Connection, EventType, HubError, IncomingEvent};

use super::ChatContext;

fn decode_object(event: &IncomingEvent) -> Result<Map<String, Value>, HubError> {
    event.decode_payload()
}

async fn rebroadcast(
    ctx: &ChatContext,
    members: &[Arc<Connection>],
    event_type: EventType,
    payload: Map<String, Value>,
) -> Result<(), HubError> {
    ctx.pump
        .broadcast(members, event_type, StatusCode::OK, Value::Object(payload))
        .await?;
    Ok(())
}

/// Handler for `REMINDER_CREATE`.
pub struct ReminderCreateHandler {
    ctx: ChatContext,
}

impl ReminderCreateHandler {
    pub fn new(ctx: ChatContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ChatEventHandler for ReminderCreateHandler {
    async fn handle(&self, event: IncomingEvent, _conn: Arc<Connection>) -> Result<(), HubError> {
        let Some(members) = self.ctx.registry.members_of(event.room_id).await else {
            return Ok(());
        };
        let payload = decode_object(&event)?;
        rebroadcast(&self.ctx, &members, EventType::ReminderCreate, payload).await
    }

    fn name(&self) -> &'static str {
        "ReminderCreateHandler"
    }
}

/// Handler for `REMINDER_UPDATE_STATUS`. Stamps `userId` with the acting user.
pub struct ReminderUpdateStatusHandler {
    ctx: ChatContext,
}

impl ReminderUpdateStatusHandler {
    pub fn new(ctx: ChatContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ChatEventHandler for ReminderUpdateStatusHandler {
    async fn handle(&self, event: IncomingEvent, conn: Arc<Connection>) -> Result<(), HubError> {
        let Some(members) = self.ctx.registry.members_of(event.room_id).await else {
            return Ok(());
        };
        let mut payload = decode_object(&event)?;
        payload.insert(
            "userId".to_string(),
            Value::String(conn.user_id().as_str().to_string()),
        );
        rebroadcast(&self.ctx, &members, EventType::ReminderUpdateStatus, payload).await
    }

    fn name(&self) -> &'static str {
        "ReminderUpdateStatusHandler"
    }
}
