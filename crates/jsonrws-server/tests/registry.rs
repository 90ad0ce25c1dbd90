//! Registry invariants: nickname uniqueness and room bookkeeping.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use tokio::sync::mpsc;

use jsonrws_server::registry::{Socket, SocketRegistry};

fn socket(id: &str) -> Arc<Socket> {
    let (tx, _rx) = mpsc::channel(8);
    Arc::new(Socket::new(id.to_string(), tx))
}

#[test]
fn set_nick_rejects_empty_and_duplicate() {
    let reg = SocketRegistry::new();
    let a = socket("A");
    let b = socket("B");
    reg.add(a.clone());
    reg.add(b.clone());

    assert!(reg.set_nick(&a, "  ").is_err());
    reg.set_nick(&a, "alice").unwrap();
    assert_eq!(a.nick(), "alice");
    assert!(reg.set_nick(&b, "alice").is_err());
    // re-setting your own nickname is fine
    reg.set_nick(&a, "alice").unwrap();
}

#[test]
fn rooms_garbage_collect_when_empty() {
    let reg = SocketRegistry::new();
    reg.room_enter("A", "x");
    reg.room_enter("B", "x");
    assert_eq!(reg.sockets_in("x").len(), 2);

    reg.room_exit("A", "x");
    assert_eq!(reg.room_list(), vec!["x".to_string()]);

    reg.room_exit("B", "x");
    assert!(reg.room_list().is_empty());
    assert!(reg.room_list_of("A").is_empty());
}

#[test]
fn remove_clears_memberships() {
    let reg = SocketRegistry::new();
    let a = socket("A");
    reg.add(a);
    reg.room_enter("A", "x");
    reg.room_enter("A", "y");

    assert!(reg.remove("A").is_some());
    assert!(reg.find_one("A").is_none());
    assert!(reg.room_list().is_empty());
    assert_eq!(reg.count(), 0);
}

#[test]
fn socket_ids_are_unique() {
    let reg = SocketRegistry::new();
    assert_ne!(reg.next_socket_id(), reg.next_socket_id());
}
