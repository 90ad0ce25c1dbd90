//! Closed command set.

/// Reply-only tag written into `Envelope::cmd` when a command failure is
/// reported back to the originator (the `socket/nick` failure path).
pub const CMD_ERROR: &str = "error";

/// Commands understood by the dispatcher, one variant per wire name.
///
/// Unrecognized wire values parse to `None` and dispatch as a no-op, so
/// application-level command namespaces can share the wire with this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `socket/sendone`: deliver to the single socket named by `to`.
    SendOne,
    /// `socket/send`: deliver to each socket listed in `to`.
    Send,
    /// `socket/broadcast`: deliver to every socket except the originator.
    Broadcast,
    /// `socket/sendall`: deliver to every socket, originator included.
    SendAll,
    /// `socket/sendserver`: deliver to the server-side sink only.
    SendServer,
    /// `socket/nick`: set the originator's nickname from `payload`.
    Nick,
    /// `room/enter`: join the room named by `payload`.
    RoomEnter,
    /// `room/exit`: leave the room named by `payload`.
    RoomExit,
    /// `room/exitall`: leave every room.
    RoomExitAll,
    /// `room/send`: deliver to every member of the room named by `to`.
    RoomSend,
    /// `route`: hand off to application route handlers, fire-and-forget.
    Route,
    /// `question/socket/id`: reply with the originator's socket id.
    QuestionSocketId,
    /// `question/socket/list`: reply with `{id, nickname}` for all sockets.
    QuestionSocketList,
    /// `question/room/list`: reply with every room name.
    QuestionRoomList,
    /// `question/room/listmy`: reply with the originator's rooms.
    QuestionRoomListMy,
}

impl Command {
    /// Parse a wire command name. `None` means "not ours": the dispatcher
    /// treats it as a no-op rather than an error.
    pub fn parse(cmd: &str) -> Option<Self> {
        let parsed = match cmd {
            "socket/sendone" => Command::SendOne,
            "socket/send" => Command::Send,
            "socket/broadcast" => Command::Broadcast,
            "socket/sendall" => Command::SendAll,
            "socket/sendserver" => Command::SendServer,
            "socket/nick" => Command::Nick,
            "room/enter" => Command::RoomEnter,
            "room/exit" => Command::RoomExit,
            "room/exitall" => Command::RoomExitAll,
            "room/send" => Command::RoomSend,
            "route" => Command::Route,
            "question/socket/id" => Command::QuestionSocketId,
            "question/socket/list" => Command::QuestionSocketList,
            "question/room/list" => Command::QuestionRoomList,
            "question/room/listmy" => Command::QuestionRoomListMy,
            _ => return None,
        };
        Some(parsed)
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::SendOne => "socket/sendone",
            Command::Send => "socket/send",
            Command::Broadcast => "socket/broadcast",
            Command::SendAll => "socket/sendall",
            Command::SendServer => "socket/sendserver",
            Command::Nick => "socket/nick",
            Command::RoomEnter => "room/enter",
            Command::RoomExit => "room/exit",
            Command::RoomExitAll => "room/exitall",
            Command::RoomSend => "room/send",
            Command::Route => "route",
            Command::QuestionSocketId => "question/socket/id",
            Command::QuestionSocketList => "question/socket/list",
            Command::QuestionRoomList => "question/room/list",
            Command::QuestionRoomListMy => "question/room/listmy",
        }
    }
}
