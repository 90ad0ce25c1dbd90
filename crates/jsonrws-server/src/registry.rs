//! Socket registry: connections, nicknames, and room membership.
//!
//! All dispatcher-visible state lives here:
//! - `socket_id -> Socket` (connection handles)
//! - `room -> {socket_id...}` and `socket_id -> {room...}` (bidirectional)
//!
//! Room maps garbage-collect empty sets so `room_list` only reports rooms
//! with at least one member.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::ws::Message;
use dashmap::{DashMap, DashSet};
use tokio::sync::mpsc;

use jsonrws_core::error::{JsonRwsError, Result};
use jsonrws_core::protocol::{codec, Envelope};

/// One connected socket: identifier, nickname, outbound queue sender.
pub struct Socket {
    id: String,
    nick: RwLock<String>,
    tx: mpsc::Sender<Message>,
}

impl Socket {
    pub fn new(id: String, tx: mpsc::Sender<Message>) -> Self {
        Self {
            id,
            nick: RwLock::new(String::new()),
            tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn nick(&self) -> String {
        self.nick.read().map(|n| n.clone()).unwrap_or_default()
    }

    fn set_nick_raw(&self, name: &str) {
        if let Ok(mut guard) = self.nick.write() {
            *guard = name.to_string();
        }
    }

    /// Deliver an envelope to this socket as a wire-encoded Text frame.
    /// All dispatcher-originated replies to the originator go through here.
    pub async fn send_self(&self, env: &Envelope) -> Result<()> {
        let text = codec::encode(env)?;
        self.send_text(text).await
    }

    /// Enqueue an already-encoded wire string.
    pub(crate) async fn send_text(&self, text: String) -> Result<()> {
        self.tx
            .send(Message::Text(text))
            .await
            .map_err(|_| JsonRwsError::Internal("outbound channel closed".into()))
    }
}

/// Socket registry:
/// - `socket_id -> Socket`
/// - `room -> {socket_id...}` / `socket_id -> {room...}`
pub struct SocketRegistry {
    sockets: DashMap<String, Arc<Socket>>,
    room_to_sockets: DashMap<String, DashSet<String>>,
    socket_to_rooms: DashMap<String, DashSet<String>>,
    seq: AtomicU64,
}

impl SocketRegistry {
    pub fn new() -> Self {
        Self {
            sockets: DashMap::new(),
            room_to_sockets: DashMap::new(),
            socket_to_rooms: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Mint a fresh socket id: epoch milliseconds plus a process-wide
    /// counter, so ids stay unique within a burst of connects.
    pub fn next_socket_id(&self) -> String {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{ms}{seq:06}")
    }

    pub fn add(&self, socket: Arc<Socket>) {
        self.sockets.insert(socket.id().to_string(), socket);
    }

    /// Drop a socket together with all of its room memberships.
    pub fn remove(&self, socket_id: &str) -> Option<Arc<Socket>> {
        self.room_exit_all(socket_id);
        self.sockets.remove(socket_id).map(|(_, s)| s)
    }

    pub fn find_one(&self, socket_id: &str) -> Option<Arc<Socket>> {
        self.sockets.get(socket_id).map(|r| r.value().clone())
    }

    pub fn find(&self, ids: &[String]) -> Vec<Arc<Socket>> {
        ids.iter().filter_map(|id| self.find_one(id)).collect()
    }

    pub fn all(&self) -> Vec<Arc<Socket>> {
        self.sockets.iter().map(|e| e.value().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.sockets.len()
    }

    /// Set a socket's nickname. Rejects an empty name and a name already
    /// held by a different socket.
    pub fn set_nick(&self, socket: &Socket, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JsonRwsError::BadRequest("nickname must not be empty".into()));
        }
        let taken = self
            .sockets
            .iter()
            .any(|e| e.value().id() != socket.id() && e.value().nick() == name);
        if taken {
            return Err(JsonRwsError::BadRequest(format!(
                "nickname {name:?} is already taken"
            )));
        }
        socket.set_nick_raw(name);
        Ok(())
    }

    pub fn room_enter(&self, socket_id: &str, room: &str) {
        self.room_to_sockets
            .entry(room.to_string())
            .or_insert_with(DashSet::new)
            .insert(socket_id.to_string());

        self.socket_to_rooms
            .entry(socket_id.to_string())
            .or_insert_with(DashSet::new)
            .insert(room.to_string());
    }

    pub fn room_exit(&self, socket_id: &str, room: &str) {
        if let Some(set) = self.room_to_sockets.get(room) {
            set.remove(socket_id);
            if set.is_empty() {
                drop(set);
                self.room_to_sockets.remove(room);
            }
        }
        if let Some(set) = self.socket_to_rooms.get(socket_id) {
            set.remove(room);
            if set.is_empty() {
                drop(set);
                self.socket_to_rooms.remove(socket_id);
            }
        }
    }

    pub fn room_exit_all(&self, socket_id: &str) {
        if let Some(rooms) = self.socket_to_rooms.remove(socket_id).map(|(_, v)| v) {
            for r in rooms.iter() {
                let room = r.key();
                if let Some(set) = self.room_to_sockets.get(room) {
                    set.remove(socket_id);
                    if set.is_empty() {
                        drop(set);
                        self.room_to_sockets.remove(room);
                    }
                }
            }
        }
    }

    pub fn room_list(&self) -> Vec<String> {
        self.room_to_sockets.iter().map(|e| e.key().clone()).collect()
    }

    pub fn room_list_of(&self, socket_id: &str) -> Vec<String> {
        self.socket_to_rooms
            .get(socket_id)
            .map(|set| set.iter().map(|r| r.key().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn sockets_in(&self, room: &str) -> Vec<String> {
        self.room_to_sockets
            .get(room)
            .map(|set| set.iter().map(|s| s.key().to_string()).collect())
            .unwrap_or_default()
    }
}

impl Default for SocketRegistry {
    fn default() -> Self {
        Self::new()
    }
}
