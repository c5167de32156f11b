//! Real-time group messaging hub.
//!
//! # Architecture
//!
//! ```text
//! socket ─▶ reader task ─▶ ClientEnvelope ─▶ EventRouter ─▶ handler
//!                                                              │
//!                                    GroupRegistry::members_of │
//!                                                              ▼
//!                          N addressed OutgoingEvents ─▶ shared queue
//!                                                              │
//!            any idle pump worker ◀────────────────────────────┘
//!                   │
//!                   ▼
//!     Connection::write (per-connection write lock) ─▶ target socket
//! ```
//!
//! # Components
//!
//! - [`connection`] - Socket wrapper with a write lock
//! - [`registry`] - Room → connections and connection → room, under one lock
//! - [`router`] - Event type → handler dispatch
//! - [`pump`] - Shared outgoing queue and per-connection workers
//! - [`events`] - Wire envelopes and event types
//! - [`chat_hub`] - Admission, reader loop and teardown

pub mod chat_hub;
pub mod connection;
pub mod error;
pub mod events;
pub mod pump;
pub mod registry;
pub mod router;

pub use chat_hub::ChatHub;
pub use connection::{Connection, FrameSink};
pub use error::HubError;
pub use events::{
    ClientEnvelope, ErrorPayload, EventType, IncomingEvent, OutgoingEvent, ServerEnvelope,
};
pub use pump::OutgoingPump;
pub use registry::GroupRegistry;
pub use router::{ChatEventHandler, EventRouter};
