//! jsonRWS core: the subprotocol envelope, wire codec, and command set.
//!
//! This crate defines the message-level contract spoken over a raw
//! WebSocket byte stream: what a valid envelope looks like, how it is
//! framed on the wire (single JSON object + U+0003 terminator), and the
//! closed set of commands the server dispatcher understands. It carries
//! no transport or runtime dependencies so it can be reused by the
//! server, clients, and test tooling alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `JsonRwsError`/`Result` so a server
//! process does not crash on malformed traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{JsonRwsError, Result};
