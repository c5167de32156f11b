//! Connection lifecycle: admission, inbound dispatch and teardown.

use std::sync::Arc;

use axum::extract::ws::Message;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;

use super::connection::Connection;
use super::error::HubError;
use super::events::{ClientEnvelope, IncomingEvent};
use super::pump::OutgoingPump;
use super::registry::GroupRegistry;
use super::router::EventRouter;

/// The real-time hub shared by every connection. Cheap to clone.
#[derive(Clone)]
pub struct ChatHub {
    registry: Arc<GroupRegistry>,
    router: Arc<EventRouter>,
    pump: OutgoingPump,
}

impl ChatHub {
    pub fn new(registry: Arc<GroupRegistry>, router: EventRouter, pump: OutgoingPump) -> Self {
        Self {
            registry,
            router: Arc::new(router),
            pump,
        }
    }

    pub fn registry(&self) -> &Arc<GroupRegistry> {
        &self.registry
    }

    pub fn pump(&self) -> &OutgoingPump {
        &self.pump
    }

    /// Register an already verified connection and start its pump worker.
    pub async fn admit(&self, conn: Arc<Connection>) -> JoinHandle<()> {
        self.registry.register(conn.room_id(), conn.clone()).await;
        tracing::info!(
            connection_id = %conn.id(),
            room_id = %conn.room_id(),
            user_id = %conn.user_id(),
            "Connection joined room"
        );
        self.pump.spawn_worker(conn)
    }

    /// Decode one text frame and route it.
    ///
    /// The room id comes from the connection, whatever the client sent.
    pub async fn dispatch(&self, conn: &Arc<Connection>, text: &str) -> Result<(), HubError> {
        let envelope = ClientEnvelope::parse(text)?;
        let event = IncomingEvent::from_envelope(envelope, conn.room_id());
        self.router.route(event, conn.clone()).await
    }

    /// The single teardown path. Safe to call any number of times.
    pub async fn teardown(&self, conn: &Connection) {
        if self.registry.unregister(&conn.id()).await {
            tracing::info!(
                connection_id = %conn.id(),
                room_id = %conn.room_id(),
                "Connection closed"
            );
        }
    }

    /// Run a connection until it dies.
    ///
    /// Admits the connection, reads frames on the current task and tears the
    /// connection down when the reader stops, the pump worker stops, or
    /// another task closes the connection.
    ///
    /// The pump worker is left to finish on its own. It may be carrying an
    /// event addressed to another connection, and it exits once that
    /// delivery is done.
    pub async fn serve<S>(&self, conn: Arc<Connection>, mut stream: S)
    where
        S: Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
    {
        let mut worker = self.admit(conn.clone()).await;

        tokio::select! {
            _ = self.read_frames(&conn, &mut stream) => {}
            _ = &mut worker => {}
            _ = conn.closed() => {}
        }

        self.teardown(&conn).await;
    }

    async fn read_frames<S>(&self, conn: &Arc<Connection>, stream: &mut S)
    where
        S: Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
    {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if let Err(e) = self.dispatch(conn, &text).await {
                        if e.is_fatal() {
                            tracing::debug!(
                                connection_id = %conn.id(),
                                error = %e,
                                "Fatal error while handling frame"
                            );
                            break;
                        }
                        tracing::warn!(
                            connection_id = %conn.id(),
                            room_id = %conn.room_id(),
                            error = %e,
                            "Dropped inbound frame"
                        );
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(
                        connection_id = %conn.id(),
                        "Received unsupported binary message"
                    );
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // WebSocket protocol control frames - handled by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %conn.id(), "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %conn.id(), "Receive error: {}", e);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RoomId;
    use crate::hub::events::{EventType, ServerEnvelope};
    use crate::hub::router::ChatEventHandler;
    use crate::hub::test_support::{channel_connection, stalled_connection};
    use async_trait::async_trait;
    use http::StatusCode;
    use std::time::Duration;

    /// Echoes the payload back to every member of the room.
    struct EchoHandler {
        registry: Arc<GroupRegistry>,
        pump: OutgoingPump,
    }

    #[async_trait]
    impl ChatEventHandler for EchoHandler {
        async fn handle(&self, event: IncomingEvent, _conn: Arc<Connection>) -> Result<(), HubError> {
            let Some(members) = self.registry.members_of(event.room_id).await else {
                return Ok(());
            };
            self.pump
                .broadcast(&members, EventType::ChatTyping, StatusCode::OK, event.payload)
                .await?;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "EchoHandler"
        }
    }

    fn hub() -> ChatHub {
        let registry = Arc::new(GroupRegistry::new());
        let pump = OutgoingPump::new(registry.clone(), 64, Duration::from_secs(10));
        let mut router = EventRouter::new();
        router.register(
            "CHAT_TYPING",
            Arc::new(EchoHandler {
                registry: registry.clone(),
                pump: pump.clone(),
            }),
        );
        ChatHub::new(registry, router, pump)
    }

    type Inbound = futures::channel::mpsc::UnboundedSender<Result<Message, axum::Error>>;

    fn text(json: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(json.to_string()))
    }

    async fn next_envelope(
        rx: &mut futures::channel::mpsc::UnboundedReceiver<Message>,
    ) -> ServerEnvelope {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(2), rx.next())
                .await
                .unwrap()
                .unwrap();
            if let Message::Text(text) = frame {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    fn spawn_serve(hub: &ChatHub, conn: Arc<Connection>) -> (Inbound, JoinHandle<()>) {
        let (tx, rx) = futures::channel::mpsc::unbounded();
        let hub = hub.clone();
        let handle = tokio::spawn(async move { hub.serve(conn, rx).await });
        (tx, handle)
    }

    async fn wait_registered(hub: &ChatHub, count: usize) {
        for _ in 0..100 {
            if hub.registry().connection_count().await == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} registered connections", count);
    }

    #[tokio::test]
    async fn dispatch_rejects_unsupported_event() {
        let hub = hub();
        let (conn, _rx) = channel_connection("user-1", 1);

        let err = hub
            .dispatch(&conn, r#"{"type":"CHAT_EDIT","payload":{}}"#)
            .await
            .unwrap_err();

        assert!(matches!(err, HubError::UnsupportedEvent(_)));
    }

    #[tokio::test]
    async fn connection_survives_unsupported_and_malformed_frames() {
        let hub = hub();
        let (conn, mut out) = channel_connection("user-1", 1);
        let (inbound, handle) = spawn_serve(&hub, conn.clone());
        wait_registered(&hub, 1).await;

        inbound.unbounded_send(text("not json")).unwrap();
        inbound
            .unbounded_send(text(r#"{"type":"CHAT_EDIT","payload":{}}"#))
            .unwrap();
        inbound
            .unbounded_send(text(r#"{"type":"CHAT_TYPING","payload":{"n":1}}"#))
            .unwrap();

        let envelope = next_envelope(&mut out).await;
        assert_eq!(envelope.event_type, EventType::ChatTyping);
        assert_eq!(envelope.payload["n"], 1);
        assert!(!conn.is_closed());

        drop(inbound);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn end_of_stream_tears_down_connection() {
        let hub = hub();
        let (conn, _out) = channel_connection("user-1", 7);
        let (inbound, handle) = spawn_serve(&hub, conn.clone());
        wait_registered(&hub, 1).await;

        drop(inbound);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        assert!(conn.is_closed());
        assert!(hub.registry().members_of(RoomId::new(7)).await.is_none());
    }

    #[tokio::test]
    async fn close_frame_tears_down_connection() {
        let hub = hub();
        let (conn, _out) = channel_connection("user-1", 1);
        let (inbound, handle) = spawn_serve(&hub, conn.clone());
        wait_registered(&hub, 1).await;

        inbound.unbounded_send(Ok(Message::Close(None))).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hub.registry().connection_count().await, 0);
    }

    #[tokio::test]
    async fn teardown_keeps_event_in_flight_to_another_connection() {
        let hub = hub();
        let (slow, mut slow_rx) = stalled_connection("user-slow", 1);
        hub.registry().register(RoomId::new(1), slow.clone()).await;
        let (conn, _out) = channel_connection("user-1", 1);
        let (inbound, handle) = spawn_serve(&hub, conn.clone());
        wait_registered(&hub, 2).await;

        // The only worker belongs to `conn`; it takes the event and waits on
        // the slow peer.
        hub.pump()
            .send_to(
                &slow,
                EventType::ChatTyping,
                StatusCode::OK,
                serde_json::json!({"n": 7}),
            )
            .await
            .unwrap();
        for _ in 0..100 {
            if hub.pump().pending() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(hub.pump().pending(), 0);

        inbound.unbounded_send(Ok(Message::Close(None))).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(conn.is_closed());

        assert_eq!(
            slow_rx.next().await,
            Some(Message::Text("backlog".to_string()))
        );
        let frame = tokio::time::timeout(Duration::from_secs(2), slow_rx.next())
            .await
            .expect("event was lost")
            .unwrap();
        let Message::Text(text) = frame else {
            panic!("expected a text frame");
        };
        let envelope: ServerEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope.payload["n"], 7);
        assert_eq!(hub.registry().room_of(&slow.id()).await, Some(RoomId::new(1)));
    }

    #[tokio::test]
    async fn external_teardown_stops_reader() {
        let hub = hub();
        let (conn, _out) = channel_connection("user-1", 1);
        let (_inbound, handle) = spawn_serve(&hub, conn.clone());
        wait_registered(&hub, 1).await;

        hub.teardown(&conn).await;
        hub.teardown(&conn).await;

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
