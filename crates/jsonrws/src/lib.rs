//! Top-level facade crate for jsonRWS.
//!
//! Re-exports the core protocol types and the server library so users can
//! depend on a single crate.

pub mod core {
    pub use jsonrws_core::*;
}

pub mod server {
    pub use jsonrws_server::*;
}
