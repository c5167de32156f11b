//! Outgoing pump: one shared queue, one worker per connection.
//!
//! ```text
//!  handlers ──enqueue──▶ [ shared bounded queue ] ◀──recv── worker(conn-a)
//!                                                 ◀──recv── worker(conn-b)
//!                                                 ◀──recv── worker(conn-c)
//! ```
//!
//! Every event is addressed to exactly one connection, but any worker may
//! deliver it. A worker stuck on a slow socket only stalls itself; the other
//! workers keep draining the queue.
//!
//! Two events addressed to the same connection may be picked up by different
//! workers and race for that connection's write lock, so delivery order per
//! connection is best-effort.
//!
//! The queue is bounded. Producers wait for room, which pushes back on the
//! reader task of the connection that generated the traffic; workers only
//! consume, so they never wait on the bound.

use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::connection::Connection;
use super::error::HubError;
use super::events::{EventType, OutgoingEvent};
use super::registry::GroupRegistry;

/// Handle to the shared outgoing queue. Cheap to clone.
#[derive(Clone)]
pub struct OutgoingPump {
    tx: flume::Sender<OutgoingEvent>,
    rx: flume::Receiver<OutgoingEvent>,
    registry: Arc<GroupRegistry>,
    keepalive: Duration,
}

impl OutgoingPump {
    /// Create the shared queue.
    ///
    /// # Arguments
    ///
    /// * `registry` - Used to tear down connections whose writes fail
    /// * `capacity` - Queue bound; must be non-zero
    /// * `keepalive` - Interval between pings sent by each worker to its own connection
    pub fn new(registry: Arc<GroupRegistry>, capacity: usize, keepalive: Duration) -> Self {
        let (tx, rx) = flume::bounded(capacity.max(1));
        Self {
            tx,
            rx,
            registry,
            keepalive,
        }
    }

    /// Push one addressed event, waiting while the queue is full.
    pub async fn enqueue(&self, event: OutgoingEvent) -> Result<(), HubError> {
        self.tx
            .send_async(event)
            .await
            .map_err(|_| HubError::QueueClosed)
    }

    /// Address one event to a single connection.
    pub async fn send_to(
        &self,
        target: &Arc<Connection>,
        event_type: EventType,
        status: StatusCode,
        payload: Value,
    ) -> Result<(), HubError> {
        self.enqueue(OutgoingEvent::new(target.clone(), event_type, status, payload))
            .await
    }

    /// Fan out one event as N addressed events, one per member.
    ///
    /// Returns the number of events enqueued.
    pub async fn broadcast(
        &self,
        members: &[Arc<Connection>],
        event_type: EventType,
        status: StatusCode,
        payload: Value,
    ) -> Result<usize, HubError> {
        for member in members {
            self.send_to(member, event_type, status, payload.clone()).await?;
        }
        Ok(members.len())
    }

    /// Events waiting to be delivered.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Start the worker for a newly admitted connection.
    pub fn spawn_worker(&self, conn: Arc<Connection>) -> JoinHandle<()> {
        tokio::spawn(self.clone().run_worker(conn))
    }

    /// Worker loop for one connection.
    ///
    /// Delivers queued events to whichever connection they address and pings
    /// its own connection every keepalive interval. Stops when its own
    /// connection closes, when a ping fails (after tearing the connection
    /// down), or when the queue is gone.
    pub async fn run_worker(self, conn: Arc<Connection>) {
        let mut keepalive = interval_at(Instant::now() + self.keepalive, self.keepalive);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = conn.closed() => break,
                received = self.rx.recv_async() => match received {
                    Ok(event) => self.deliver(event).await,
                    Err(_) => break,
                },
                _ = keepalive.tick() => {
                    if let Err(e) = conn.ping().await {
                        tracing::debug!(
                            connection_id = %conn.id(),
                            room_id = %conn.room_id(),
                            error = %e,
                            "Keepalive failed, closing connection"
                        );
                        self.registry.unregister(&conn.id()).await;
                        break;
                    }
                }
            }
        }

        tracing::trace!(connection_id = %conn.id(), "Pump worker stopped");
    }

    async fn deliver(&self, event: OutgoingEvent) {
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(event_type = %event.event_type, error = %e, "Dropping outgoing event");
                return;
            }
        };

        let target = event.target;
        if let Err(e) = target.write(frame).await {
            tracing::debug!(
                connection_id = %target.id(),
                event_type = %event.event_type,
                error = %e,
                "Write failed, closing connection"
            );
            self.registry.unregister(&target.id()).await;
        }
    }

    #[cfg(test)]
    pub(crate) fn drain_pending(&self) -> Vec<OutgoingEvent> {
        self.rx.drain().collect()
    }
}
