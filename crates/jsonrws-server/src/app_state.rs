//! Shared application state for the jsonRWS server.
//!
//! Builds the collaborator graph (registry -> egress -> notifier ->
//! dispatcher) once and hands cloneable handles to the transport layer.

use std::sync::Arc;

use tokio::time::Duration;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::notifier::RouteNotifier;
use crate::registry::SocketRegistry;
use crate::transfer::Egress;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    registry: Arc<SocketRegistry>,
    transfer: Arc<Egress>,
    dispatcher: Arc<Dispatcher>,
    notifier: Arc<RouteNotifier>,
}

impl AppState {
    /// Build application state. Must run on a tokio runtime: the route
    /// notifier pump and the server-sink drain are spawned here.
    pub fn new(cfg: ServerConfig) -> Self {
        let registry = Arc::new(SocketRegistry::new());
        let (egress, mut sink_rx) = Egress::new(
            registry.clone(),
            Duration::from_millis(cfg.server.send_timeout_ms),
        );
        let transfer = Arc::new(egress);

        // `socket/sendserver` envelopes land here.
        tokio::spawn(async move {
            while let Some(env) = sink_rx.recv().await {
                tracing::info!(from = %env.from, id = %env.id, payload = ?env.payload, "server caught message");
            }
        });

        let notifier = Arc::new(RouteNotifier::start(registry.clone(), transfer.clone()));
        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            transfer.clone(),
            notifier.clone(),
        ));

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                transfer,
                dispatcher,
                notifier,
            }),
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &Arc<SocketRegistry> {
        &self.inner.registry
    }

    pub fn transfer(&self) -> &Arc<Egress> {
        &self.inner.transfer
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }

    pub fn notifier(&self) -> &Arc<RouteNotifier> {
        &self.inner.notifier
    }
}
