//! Route notifier: fire-and-forget hand-off of `route` envelopes to
//! application-level handlers.
//!
//! The dispatcher publishes into an unbounded channel and moves on; a pump
//! task drains the channel and spawns one task per registered handler. The
//! dispatcher never waits on, or learns, a handler's outcome.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::mpsc;

use jsonrws_core::error::Result;
use jsonrws_core::protocol::Envelope;

use crate::registry::{Socket, SocketRegistry};
use crate::transfer::Egress;

/// One routed message: the envelope plus its originating socket.
#[derive(Clone)]
pub struct RouteEvent {
    pub envelope: Envelope,
    pub socket: Arc<Socket>,
}

/// Application-level consumer of routed envelopes.
#[async_trait]
pub trait RouteHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        event: RouteEvent,
        registry: Arc<SocketRegistry>,
        transfer: Arc<Egress>,
    ) -> Result<()>;
}

/// Publish point for the `route` command.
pub struct RouteNotifier {
    tx: mpsc::UnboundedSender<RouteEvent>,
    handlers: Arc<RwLock<Vec<Arc<dyn RouteHandler>>>>,
}

impl RouteNotifier {
    /// Create the notifier and start its pump task on the current runtime.
    pub fn start(registry: Arc<SocketRegistry>, transfer: Arc<Egress>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<RouteEvent>();
        let handlers: Arc<RwLock<Vec<Arc<dyn RouteHandler>>>> = Arc::new(RwLock::new(Vec::new()));

        let pump_handlers = handlers.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let current: Vec<Arc<dyn RouteHandler>> = pump_handlers
                    .read()
                    .map(|h| h.clone())
                    .unwrap_or_default();
                if current.is_empty() {
                    tracing::debug!(from = %event.envelope.from, "route event with no handlers, dropping");
                    continue;
                }
                for handler in current {
                    let ev = event.clone();
                    let reg = registry.clone();
                    let tr = transfer.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handler.handle(ev, reg, tr).await {
                            tracing::warn!(error = %e, "route handler failed");
                        }
                    });
                }
            }
        });

        Self { tx, handlers }
    }

    pub fn register(&self, handler: Arc<dyn RouteHandler>) {
        if let Ok(mut guard) = self.handlers.write() {
            guard.push(handler);
        }
    }

    /// Fire-and-forget publish. A closed pump only happens during
    /// shutdown, so the send result is ignored.
    pub fn emit(&self, event: RouteEvent) {
        let _ = self.tx.send(event);
    }
}
