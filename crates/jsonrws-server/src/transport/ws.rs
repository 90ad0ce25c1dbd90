//! WebSocket session handling.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Register the socket and greet it with its assigned id
//! - Lifecycle: ping tick + idle timeout
//! - Decode each Text frame once, then hand the envelope to the dispatcher
//!
//! A protocol violation closes the connection: validation precedes any
//! dispatch. Collaborator failures during dispatch are logged and the
//! session continues.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use jsonrws_core::error::Result;
use jsonrws_core::protocol::{codec, Envelope, To};

use crate::app_state::AppState;
use crate::registry::Socket;

/// Sender id on server-originated envelopes.
const SERVER_ID: &str = "0";

fn correlation_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
        .to_string()
}

/// Connection greeting: tells the client its socket id. `info/*` is an
/// application namespace outside the dispatcher's closed command set.
fn greeting(socket_id: &str) -> Envelope {
    Envelope {
        id: correlation_id(),
        from: SERVER_ID.to_string(),
        to: To::One(socket_id.to_string()),
        cmd: "info/socket/id".to_string(),
        payload: Some(socket_id.into()),
    }
}

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = run_session(app, socket).await {
            tracing::warn!(error = %e, "session ended with error");
        }
    })
}

async fn run_session(app: AppState, socket: WebSocket) -> Result<()> {
    let (out_tx, out_rx) = mpsc::channel::<Message>(app.cfg().server.outbound_queue);
    let (ws_tx, ws_rx) = socket.split();

    let socket_id = app.registry().next_socket_id();
    let sock = Arc::new(Socket::new(socket_id.clone(), out_tx.clone()));
    app.registry().add(sock.clone());
    tracing::info!(socket = %socket_id, "socket connected");

    let result = session_loop(&app, &sock, ws_tx, ws_rx, out_rx, out_tx).await;

    app.registry().remove(sock.id());
    tracing::info!(socket = %socket_id, "socket disconnected");
    result
}

async fn session_loop(
    app: &AppState,
    sock: &Arc<Socket>,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut ws_rx: SplitStream<WebSocket>,
    mut out_rx: mpsc::Receiver<Message>,
    out_tx: mpsc::Sender<Message>,
) -> Result<()> {
    let cfg = &app.cfg().server;
    let idle_timeout = Duration::from_millis(cfg.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval(Duration::from_millis(cfg.ping_interval_ms));
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();

    sock.send_self(&greeting(sock.id())).await?;

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                last_activity = Instant::now();

                match msg {
                    Message::Text(s) => {
                        let env = match codec::decode(&s) {
                            Ok(env) => env,
                            Err(e) => {
                                tracing::warn!(socket = sock.id(), error = %e, "protocol violation, closing");
                                return Err(e);
                            }
                        };
                        if let Err(e) = app.dispatcher().dispatch(sock, env).await {
                            tracing::warn!(socket = sock.id(), error = %e, "dispatch failed");
                        }
                    }
                    Message::Binary(_) => {
                        // Not part of the subprotocol.
                        tracing::debug!(socket = sock.id(), "ignoring binary frame");
                    }
                    Message::Ping(payload) => {
                        let _ = out_tx.send(Message::Pong(payload)).await;
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => break,
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = out_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    tracing::info!(socket = sock.id(), "idle timeout");
                    break;
                }
            }
        }
    }

    Ok(())
}
