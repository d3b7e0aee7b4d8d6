//! Real-time chat: one room per transaction.

pub mod protocol;
pub mod room;
pub mod session;

pub use protocol::{ClientEvent, ServerEvent};
pub use room::{ChatError, ConnectionId, Joined, RoomEvent, RoomManager, RoomMember};
pub use session::ChatSession;
