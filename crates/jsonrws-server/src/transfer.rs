//! Egress engine: wire-encode once, fan out to targets.
//!
//! Every delivery path takes the envelope through the codec exactly once
//! and sends the prepared wire text to each target, so a broadcast to N
//! sockets serializes once, not N times. Multi-target fan-out runs
//! concurrently with a per-socket timeout: one slow or full outbound queue
//! never stalls the remaining targets.

use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use jsonrws_core::error::Result;
use jsonrws_core::protocol::{codec, Envelope};

use crate::registry::{Socket, SocketRegistry};

/// Message-transfer collaborator consumed by the dispatcher.
pub struct Egress {
    registry: Arc<SocketRegistry>,
    send_timeout: Duration,
    sink: mpsc::UnboundedSender<Envelope>,
}

impl Egress {
    /// Returns the engine plus the receiving end of the server-side sink
    /// (`socket/sendserver` envelopes land there).
    pub fn new(
        registry: Arc<SocketRegistry>,
        send_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (sink, sink_rx) = mpsc::unbounded_channel();
        (
            Self {
                registry,
                send_timeout,
                sink,
            },
            sink_rx,
        )
    }

    /// Deliver to exactly one socket.
    pub async fn send_one(&self, env: &Envelope, socket: &Socket) -> Result<()> {
        let text = codec::encode(env)?;
        socket.send_text(text).await
    }

    /// Deliver to each of the given sockets concurrently.
    pub async fn send(&self, env: &Envelope, sockets: &[Arc<Socket>]) -> Result<()> {
        let text = codec::encode(env)?;
        let mut futs = FuturesUnordered::new();
        for s in sockets {
            let msg = text.clone();
            futs.push(async move {
                let _ = timeout(self.send_timeout, s.send_text(msg)).await;
            });
        }
        while futs.next().await.is_some() {}
        Ok(())
    }

    /// Deliver to every registered socket except the originator.
    pub async fn broadcast(&self, env: &Envelope, exclude: &Socket) -> Result<()> {
        let targets: Vec<Arc<Socket>> = self
            .registry
            .all()
            .into_iter()
            .filter(|s| s.id() != exclude.id())
            .collect();
        self.send(env, &targets).await
    }

    /// Deliver to every registered socket, originator included.
    pub async fn send_all(&self, env: &Envelope) -> Result<()> {
        let targets = self.registry.all();
        self.send(env, &targets).await
    }

    /// Deliver to every current member of the room.
    pub async fn send_room(&self, env: &Envelope, sender: &Socket, room: &str) -> Result<()> {
        let ids = self.registry.sockets_in(room);
        let targets = self.registry.find(&ids);
        tracing::debug!(from = sender.id(), room, targets = targets.len(), "room send");
        self.send(env, &targets).await
    }

    /// Server-side sink: no client fan-out. The app drains the receiver
    /// returned by [`Egress::new`].
    pub fn catch_message(&self, env: Envelope) {
        let _ = self.sink.send(env);
    }
}
