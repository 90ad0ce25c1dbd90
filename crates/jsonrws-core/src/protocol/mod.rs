//! Protocol modules (envelope, wire codec, command set).
//!
//! This module hosts the message-level wire contract:
//! - Envelope: the structured message unit, with its addressing forms.
//! - Codec: delimiter framing + field-set validation, both directions.
//! - Command: the closed set of command names the dispatcher interprets.
//!
//! All parsers are panic-free: malformed input is reported as
//! `JsonRwsError::ProtocolViolation` instead of panicking, keeping the
//! server resilient to hostile traffic.

pub mod codec;
pub mod command;
pub mod envelope;

pub use codec::{decode, encode, DELIMITER};
pub use command::{Command, CMD_ERROR};
pub use envelope::{Envelope, To};
