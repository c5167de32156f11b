//! Chat Hub - real-time group messaging.
//!
//! Authenticated WebSocket connections join one group (room) each. Inbound
//! events are routed to handlers that persist through the history store and
//! fan results out to every member through a shared outgoing queue.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod hub;
pub mod ports;
