//! jsonRWS server library entry.
//!
//! This crate wires the WebSocket transport, socket registry, egress
//! engine, command dispatcher, and route notifier into a cohesive server
//! stack. It is intended to be consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod notifier;
pub mod registry;
pub mod router;
pub mod transfer;
pub mod transport;
