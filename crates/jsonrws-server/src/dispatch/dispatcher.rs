//! The command dispatcher: one decoded envelope in, collaborator side
//! effects out.
//!
//! Stateless per invocation. Connection, nickname, and room state live in
//! the registry; the dispatcher only holds collaborator handles, injected
//! at construction so tests can wire their own. Replies to the originator
//! reuse the inbound envelope with `payload` (and, on the nickname failure
//! path, `cmd`) rewritten, and always travel through `Socket::send_self`,
//! i.e. through the codec — the dispatcher never touches raw bytes.

use std::sync::Arc;

use serde_json::{json, Value};

use jsonrws_core::error::Result;
use jsonrws_core::protocol::{Command, Envelope, CMD_ERROR};

use crate::notifier::{RouteEvent, RouteNotifier};
use crate::registry::{Socket, SocketRegistry};
use crate::transfer::Egress;

pub struct Dispatcher {
    registry: Arc<SocketRegistry>,
    transfer: Arc<Egress>,
    notifier: Arc<RouteNotifier>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<SocketRegistry>,
        transfer: Arc<Egress>,
        notifier: Arc<RouteNotifier>,
    ) -> Self {
        Self {
            registry,
            transfer,
            notifier,
        }
    }

    /// Interpret one envelope from `socket` and perform its side effects.
    ///
    /// Collaborator failures propagate to the caller, except for
    /// `socket/nick`, which converts its failure into an `error`-tagged
    /// reply. Unrecognized commands are a no-op so application-level
    /// command namespaces can share the wire.
    pub async fn dispatch(&self, socket: &Arc<Socket>, env: Envelope) -> Result<()> {
        let Some(cmd) = Command::parse(&env.cmd) else {
            tracing::debug!(from = socket.id(), cmd = %env.cmd, "unrecognized command, ignoring");
            return Ok(());
        };

        match cmd {
            Command::SendOne => {
                // The target id comes from `to`, not from the envelope's
                // own `id` field.
                let Some(target) = env.to.as_one() else {
                    tracing::debug!(from = socket.id(), "sendone without a single target");
                    return Ok(());
                };
                if let Some(found) = self.registry.find_one(target) {
                    self.transfer.send_one(&env, &found).await?;
                }
                Ok(())
            }

            Command::Send => {
                let found = self.registry.find(env.to.ids());
                self.transfer.send(&env, &found).await
            }

            Command::Broadcast => self.transfer.broadcast(&env, socket).await,

            Command::SendAll => self.transfer.send_all(&env).await,

            Command::SendServer => {
                self.transfer.catch_message(env);
                Ok(())
            }

            Command::Nick => {
                let name = payload_str(&env.payload);
                match self.registry.set_nick(socket, &name) {
                    Ok(()) => {
                        tracing::info!(socket = socket.id(), nick = %socket.nick(), "nickname set");
                        let reply = reply_with(&env, Value::String(socket.nick()));
                        socket.send_self(&reply).await
                    }
                    Err(e) => {
                        let mut reply = reply_with(&env, Value::String(e.to_string()));
                        reply.cmd = CMD_ERROR.to_string();
                        socket.send_self(&reply).await
                    }
                }
            }

            Command::RoomEnter => {
                let room = payload_str(&env.payload);
                self.registry.room_enter(socket.id(), &room);
                tracing::info!(socket = socket.id(), room = %room, "room enter");
                let reply = reply_with(&env, json!(format!("entered room {room:?}")));
                socket.send_self(&reply).await
            }

            Command::RoomExit => {
                let room = payload_str(&env.payload);
                self.registry.room_exit(socket.id(), &room);
                tracing::info!(socket = socket.id(), room = %room, "room exit");
                let reply = reply_with(&env, json!(format!("exited room {room:?}")));
                socket.send_self(&reply).await
            }

            Command::RoomExitAll => {
                self.registry.room_exit_all(socket.id());
                tracing::info!(socket = socket.id(), "room exit all");
                let reply = reply_with(&env, json!("exited all rooms"));
                socket.send_self(&reply).await
            }

            Command::RoomSend => {
                let Some(room) = env.to.as_one() else {
                    tracing::debug!(from = socket.id(), "room send without a room name");
                    return Ok(());
                };
                self.transfer.send_room(&env, socket, room).await
            }

            Command::Route => {
                self.notifier.emit(RouteEvent {
                    envelope: env,
                    socket: socket.clone(),
                });
                Ok(())
            }

            Command::QuestionSocketId => {
                let reply = reply_with(&env, Value::String(socket.id().to_string()));
                socket.send_self(&reply).await
            }

            Command::QuestionSocketList => {
                let list: Vec<Value> = self
                    .registry
                    .all()
                    .into_iter()
                    .map(|s| json!({ "id": s.id(), "nickname": s.nick() }))
                    .collect();
                let reply = reply_with(&env, Value::Array(list));
                socket.send_self(&reply).await
            }

            Command::QuestionRoomList => {
                let reply = reply_with(&env, json!(self.registry.room_list()));
                socket.send_self(&reply).await
            }

            Command::QuestionRoomListMy => {
                let reply = reply_with(&env, json!(self.registry.room_list_of(&env.from)));
                socket.send_self(&reply).await
            }
        }
    }
}

/// Payload as a plain string. Non-string payloads fall back to their JSON
/// text; shape validation is left to the collaborators.
fn payload_str(payload: &Option<Value>) -> String {
    match payload {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// Reply to the originator: same envelope, payload replaced.
fn reply_with(env: &Envelope, payload: Value) -> Envelope {
    let mut reply = env.clone();
    reply.payload = Some(payload);
    reply
}
