//! Dispatcher addressing and reply-path tests against real in-memory
//! collaborators (channel-backed sockets).

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::ws::Message;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};
use tokio::time::Duration;

use jsonrws_core::error::Result;
use jsonrws_core::protocol::{codec, Envelope, To};
use jsonrws_server::dispatch::Dispatcher;
use jsonrws_server::notifier::{RouteEvent, RouteHandler, RouteNotifier};
use jsonrws_server::registry::{Socket, SocketRegistry};
use jsonrws_server::transfer::Egress;

struct Rig {
    registry: Arc<SocketRegistry>,
    dispatcher: Dispatcher,
    notifier: Arc<RouteNotifier>,
    sink_rx: mpsc::UnboundedReceiver<Envelope>,
}

fn rig() -> Rig {
    let registry = Arc::new(SocketRegistry::new());
    let (egress, sink_rx) = Egress::new(registry.clone(), Duration::from_millis(500));
    let transfer = Arc::new(egress);
    let notifier = Arc::new(RouteNotifier::start(registry.clone(), transfer.clone()));
    let dispatcher = Dispatcher::new(registry.clone(), transfer, notifier.clone());
    Rig {
        registry,
        dispatcher,
        notifier,
        sink_rx,
    }
}

fn connect(rig: &Rig, id: &str) -> (Arc<Socket>, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(32);
    let sock = Arc::new(Socket::new(id.to_string(), tx));
    rig.registry.add(sock.clone());
    (sock, rx)
}

fn envelope(from: &str, to: To, cmd: &str, payload: Option<Value>) -> Envelope {
    Envelope {
        id: "1".into(),
        from: from.into(),
        to,
        cmd: cmd.into(),
        payload,
    }
}

/// Next delivered envelope, if any is already queued.
fn try_recv(rx: &mut mpsc::Receiver<Message>) -> Option<Envelope> {
    match rx.try_recv() {
        Ok(Message::Text(s)) => Some(codec::decode(&s).unwrap()),
        _ => None,
    }
}

#[tokio::test]
async fn broadcast_excludes_originator() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");
    let (_b, mut b_rx) = connect(&r, "B");
    let (_c, mut c_rx) = connect(&r, "C");

    let env = envelope("A", To::none(), "socket/broadcast", Some(json!("hi")));
    r.dispatcher.dispatch(&a, env.clone()).await.unwrap();

    assert_eq!(try_recv(&mut b_rx).unwrap(), env);
    assert_eq!(try_recv(&mut c_rx).unwrap(), env);
    assert!(try_recv(&mut a_rx).is_none());
}

#[tokio::test]
async fn sendall_includes_originator() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");
    let (_b, mut b_rx) = connect(&r, "B");
    let (_c, mut c_rx) = connect(&r, "C");

    let env = envelope("A", To::none(), "socket/sendall", Some(json!("hi all")));
    r.dispatcher.dispatch(&a, env.clone()).await.unwrap();

    assert_eq!(try_recv(&mut a_rx).unwrap(), env);
    assert_eq!(try_recv(&mut b_rx).unwrap(), env);
    assert_eq!(try_recv(&mut c_rx).unwrap(), env);
}

#[tokio::test]
async fn sendone_targets_the_to_field() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");
    let (_b, mut b_rx) = connect(&r, "B");

    let env = envelope("A", "B".into(), "socket/sendone", Some(json!("direct")));
    r.dispatcher.dispatch(&a, env.clone()).await.unwrap();

    assert_eq!(try_recv(&mut b_rx).unwrap(), env);
    assert!(try_recv(&mut a_rx).is_none());
}

#[tokio::test]
async fn sendone_to_unknown_target_is_silent() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");

    let env = envelope("A", "ghost".into(), "socket/sendone", Some(json!("lost")));
    r.dispatcher.dispatch(&a, env).await.unwrap();

    assert!(try_recv(&mut a_rx).is_none());
}

#[tokio::test]
async fn send_skips_missing_targets() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");
    let (_b, mut b_rx) = connect(&r, "B");

    let to = To::Many(vec!["B".into(), "ghost".into()]);
    let env = envelope("A", to, "socket/send", Some(json!("multi")));
    r.dispatcher.dispatch(&a, env.clone()).await.unwrap();

    assert_eq!(try_recv(&mut b_rx).unwrap(), env);
    assert!(try_recv(&mut a_rx).is_none());
}

#[tokio::test]
async fn room_send_reaches_only_members() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");
    let (_b, mut b_rx) = connect(&r, "B");
    let (_c, mut c_rx) = connect(&r, "C");
    let (_d, mut d_rx) = connect(&r, "D");

    r.registry.room_enter("B", "x");
    r.registry.room_enter("C", "x");
    r.registry.room_enter("D", "y");

    // A is not a member of "x" but may still address it.
    let env = envelope("A", "x".into(), "room/send", Some(json!("room msg")));
    r.dispatcher.dispatch(&a, env.clone()).await.unwrap();

    assert_eq!(try_recv(&mut b_rx).unwrap(), env);
    assert_eq!(try_recv(&mut c_rx).unwrap(), env);
    assert!(try_recv(&mut a_rx).is_none());
    assert!(try_recv(&mut d_rx).is_none());
}

#[tokio::test]
async fn room_enter_exit_lifecycle() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");

    let enter = envelope("A", To::none(), "room/enter", Some(json!("lobby")));
    r.dispatcher.dispatch(&a, enter).await.unwrap();

    let reply = try_recv(&mut a_rx).unwrap();
    assert_eq!(reply.cmd, "room/enter");
    assert!(reply.payload.unwrap().as_str().unwrap().contains("lobby"));
    assert_eq!(r.registry.room_list(), vec!["lobby".to_string()]);
    assert_eq!(r.registry.room_list_of("A"), vec!["lobby".to_string()]);

    let exit = envelope("A", To::none(), "room/exit", Some(json!("lobby")));
    r.dispatcher.dispatch(&a, exit).await.unwrap();

    let reply = try_recv(&mut a_rx).unwrap();
    assert_eq!(reply.cmd, "room/exit");
    assert!(r.registry.room_list().is_empty());
    assert!(r.registry.room_list_of("A").is_empty());
}

#[tokio::test]
async fn room_exitall_clears_memberships() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");

    r.registry.room_enter("A", "x");
    r.registry.room_enter("A", "y");

    let env = envelope("A", To::none(), "room/exitall", None);
    r.dispatcher.dispatch(&a, env).await.unwrap();

    let reply = try_recv(&mut a_rx).unwrap();
    assert_eq!(reply.cmd, "room/exitall");
    assert!(reply.payload.is_some());
    assert!(r.registry.room_list_of("A").is_empty());
    assert!(r.registry.room_list().is_empty());
}

#[tokio::test]
async fn nick_sets_and_confirms() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");

    let env = envelope("A", To::none(), "socket/nick", Some(json!(" alice ")));
    r.dispatcher.dispatch(&a, env).await.unwrap();

    let reply = try_recv(&mut a_rx).unwrap();
    assert_eq!(reply.cmd, "socket/nick");
    // canonical (trimmed) form comes back
    assert_eq!(reply.payload.unwrap(), json!("alice"));
    assert_eq!(a.nick(), "alice");
}

#[tokio::test]
async fn nick_conflict_replies_error_only_to_originator() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");
    let (b, mut b_rx) = connect(&r, "B");
    r.registry.set_nick(&b, "taken").unwrap();

    let env = envelope("A", To::none(), "socket/nick", Some(json!("taken")));
    r.dispatcher.dispatch(&a, env).await.unwrap();

    let reply = try_recv(&mut a_rx).unwrap();
    assert_eq!(reply.cmd, "error");
    assert!(!reply.payload.unwrap().as_str().unwrap().is_empty());
    assert!(try_recv(&mut a_rx).is_none());
    assert!(try_recv(&mut b_rx).is_none());
    assert_eq!(a.nick(), "");
}

#[tokio::test]
async fn unknown_command_is_a_noop() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");
    let (_b, mut b_rx) = connect(&r, "B");

    let env = envelope("A", To::none(), "foo/bar", Some(json!(1)));
    r.dispatcher.dispatch(&a, env).await.unwrap();

    assert!(try_recv(&mut a_rx).is_none());
    assert!(try_recv(&mut b_rx).is_none());
}

#[tokio::test]
async fn question_socket_id_replies_own_id() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");

    let env = envelope("A", To::none(), "question/socket/id", None);
    r.dispatcher.dispatch(&a, env).await.unwrap();

    let reply = try_recv(&mut a_rx).unwrap();
    assert_eq!(reply.cmd, "question/socket/id");
    assert_eq!(reply.payload.unwrap(), json!("A"));
}

#[tokio::test]
async fn question_socket_list_includes_nicknames() {
    let r = rig();
    let (a, _a_rx) = connect(&r, "A");
    let (b, mut b_rx) = connect(&r, "B");
    r.registry.set_nick(&a, "alice").unwrap();

    let env = envelope("B", To::none(), "question/socket/list", None);
    r.dispatcher.dispatch(&b, env).await.unwrap();

    let reply = try_recv(&mut b_rx).unwrap();
    let list = reply.payload.unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.contains(&json!({ "id": "A", "nickname": "alice" })));
    assert!(list.contains(&json!({ "id": "B", "nickname": "" })));
}

#[tokio::test]
async fn question_room_lists() {
    let r = rig();
    let (a, mut a_rx) = connect(&r, "A");
    r.registry.room_enter("A", "x");
    r.registry.room_enter("B", "x");
    r.registry.room_enter("B", "y");

    let env = envelope("A", To::none(), "question/room/list", None);
    r.dispatcher.dispatch(&a, env).await.unwrap();

    let reply = try_recv(&mut a_rx).unwrap();
    let mut rooms: Vec<String> = serde_json::from_value(reply.payload.unwrap()).unwrap();
    rooms.sort();
    assert_eq!(rooms, vec!["x".to_string(), "y".to_string()]);

    let env = envelope("A", To::none(), "question/room/listmy", None);
    r.dispatcher.dispatch(&a, env).await.unwrap();

    let reply = try_recv(&mut a_rx).unwrap();
    let mine: Vec<String> = serde_json::from_value(reply.payload.unwrap()).unwrap();
    assert_eq!(mine, vec!["x".to_string()]);
}

#[tokio::test]
async fn sendserver_lands_in_sink_only() {
    let mut r = rig();
    let (a, mut a_rx) = connect(&r, "A");

    let env = envelope("A", To::none(), "socket/sendserver", Some(json!("for server")));
    r.dispatcher.dispatch(&a, env.clone()).await.unwrap();

    assert_eq!(r.sink_rx.try_recv().unwrap(), env);
    assert!(try_recv(&mut a_rx).is_none());
}

struct Recorder {
    seen: Mutex<Vec<RouteEvent>>,
    notify: Notify,
}

#[async_trait]
impl RouteHandler for Recorder {
    async fn handle(
        &self,
        event: RouteEvent,
        _registry: Arc<SocketRegistry>,
        _transfer: Arc<Egress>,
    ) -> Result<()> {
        self.seen.lock().unwrap().push(event);
        self.notify.notify_one();
        Ok(())
    }
}

#[tokio::test]
async fn route_hands_off_to_registered_handler() {
    let r = rig();
    let recorder = Arc::new(Recorder {
        seen: Mutex::new(Vec::new()),
        notify: Notify::new(),
    });
    r.notifier.register(recorder.clone());

    let (a, mut a_rx) = connect(&r, "A");
    let env = envelope("A", To::none(), "route", Some(json!({ "uri": "/chat" })));
    r.dispatcher.dispatch(&a, env.clone()).await.unwrap();

    // dispatch already returned; the handler runs on its own time
    tokio::time::timeout(Duration::from_secs(1), recorder.notify.notified())
        .await
        .unwrap();

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].envelope, env);
    assert_eq!(seen[0].socket.id(), "A");
    drop(seen);

    // no reply to the originator
    assert!(try_recv(&mut a_rx).is_none());
}
