//! Wrapped WebSocket connection.
//!
//! Writes are serialized by a per-connection lock so concurrent pump workers
//! never interleave frames on one socket. Reads are not guarded: exactly one
//! reader task owns the read half of each socket.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tokio::sync::{watch, Mutex};

use crate::domain::foundation::{AuthenticatedUser, ConnectionId, RoomId, UserId};

use super::error::HubError;

/// Longest wait for a peer to accept the close frame.
pub const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// Write half of a socket.
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = axum::Error> + Send>>;

/// One admitted, authenticated socket bound to one room for its lifetime.
///
/// The connection does not heal itself: a caller whose write fails must
/// tear the connection down through the registry.
pub struct Connection {
    id: ConnectionId,
    user: AuthenticatedUser,
    room_id: RoomId,
    sink: Mutex<FrameSink>,
    closed: watch::Sender<bool>,
}

impl Connection {
    /// Wrap the write half of a socket.
    pub fn new<S>(user: AuthenticatedUser, room_id: RoomId, sink: S) -> Arc<Self>
    where
        S: Sink<Message, Error = axum::Error> + Send + 'static,
    {
        let (closed, _) = watch::channel(false);
        Arc::new(Self {
            id: ConnectionId::new(),
            user,
            room_id,
            sink: Mutex::new(Box::pin(sink)),
            closed,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user(&self) -> &AuthenticatedUser {
        &self.user
    }

    /// Verified identity of the user behind this socket.
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// The room this connection was admitted to.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Write one frame, holding the write lock for the whole send.
    ///
    /// A write still waiting on the lock or on a slow peer is abandoned as
    /// soon as the connection is closed.
    pub async fn write(&self, frame: Message) -> Result<(), HubError> {
        if self.is_closed() {
            return Err(HubError::ConnectionClosed(self.id));
        }
        let send = async {
            let mut sink = self.sink.lock().await;
            sink.send(frame).await
        };
        tokio::select! {
            biased;
            _ = self.closed() => Err(HubError::ConnectionClosed(self.id)),
            result = send => result.map_err(|e| HubError::transport(self.id, e)),
        }
    }

    /// Send a keepalive ping.
    pub async fn ping(&self) -> Result<(), HubError> {
        self.write(Message::Ping(Vec::new())).await
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the connection has been closed.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives as long as `self`, so this only ends on close.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Close the socket. Returns false if it was already closed.
    ///
    /// Only the registry calls this, as part of unregistering the
    /// connection. Setting the closed flag releases any write in progress;
    /// the close frame is then sent unless the peer does not accept it
    /// within [`CLOSE_FRAME_TIMEOUT`].
    pub(crate) async fn close(&self) -> bool {
        let first = self.closed.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        });
        if !first {
            return false;
        }

        let farewell = async {
            let mut sink = self.sink.lock().await;
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        };
        if tokio::time::timeout(CLOSE_FRAME_TIMEOUT, farewell).await.is_err() {
            tracing::debug!(connection_id = %self.id, "Peer not accepting frames, skipped close frame");
        }
        true
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user.id)
            .field("room_id", &self.room_id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::test_support::{broken_connection, channel_connection, stalled_connection};
    use futures::StreamExt;

    #[tokio::test]
    async fn write_delivers_frame_to_sink() {
        let (conn, mut rx) = channel_connection("user-1", 1);

        conn.write(Message::Text("hello".to_string())).await.unwrap();

        assert_eq!(rx.next().await, Some(Message::Text("hello".to_string())));
    }

    #[tokio::test]
    async fn concurrent_writes_never_interleave() {
        let (conn, rx) = channel_connection("user-1", 1);

        let mut tasks = Vec::new();
        for i in 0..50 {
            let conn = conn.clone();
            tasks.push(tokio::spawn(async move {
                conn.write(Message::Text(format!("frame-{}", i))).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        drop(conn);

        let frames: Vec<Message> = rx.collect().await;
        assert_eq!(frames.len(), 50);
        assert!(frames
            .iter()
            .all(|f| matches!(f, Message::Text(t) if t.starts_with("frame-"))));
    }

    #[tokio::test]
    async fn write_to_broken_sink_is_transport_error() {
        let conn = broken_connection("user-1", 1);

        let err = conn.ping().await.unwrap_err();

        assert!(matches!(err, HubError::Transport { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn close_happens_once_and_sends_close_frame() {
        let (conn, mut rx) = channel_connection("user-1", 1);

        assert!(conn.close().await);
        assert!(!conn.close().await);
        assert!(conn.is_closed());
        assert_eq!(rx.next().await, Some(Message::Close(None)));
    }

    #[tokio::test]
    async fn write_after_close_is_rejected() {
        let (conn, _rx) = channel_connection("user-1", 1);
        conn.close().await;

        let err = conn.write(Message::Text("late".to_string())).await.unwrap_err();
        assert!(matches!(err, HubError::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn closed_resolves_after_close() {
        let (conn, _rx) = channel_connection("user-1", 1);
        let waiter = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.closed().await })
        };

        conn.close().await;

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn close_releases_write_stuck_on_slow_peer() {
        let (conn, _rx) = stalled_connection("user-1", 1);
        let writer = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.write(Message::Text("stuck".to_string())).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!writer.is_finished());

        tokio::time::timeout(CLOSE_FRAME_TIMEOUT * 3, conn.close())
            .await
            .expect("close never returned");

        let result = tokio::time::timeout(Duration::from_secs(1), writer)
            .await
            .expect("writer still blocked")
            .unwrap();
        assert!(matches!(result, Err(HubError::ConnectionClosed(_))));
    }
}
