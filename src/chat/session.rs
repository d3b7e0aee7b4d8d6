//! One authenticated connection's view of the chat: the rooms it joined and
//! the multiplexed stream of their events.

use std::collections::HashMap;
use std::sync::Arc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{StreamExt, StreamMap};
use uuid::Uuid;

use crate::chat::protocol::{ClientEvent, JoinChat, LeaveChat, SendMessage, ServerEvent, Typing};
use crate::chat::room::{ChatError, ConnectionId, RoomEvent, RoomManager, RoomMember};
use crate::domain::User;

const IDENTITY_MISMATCH: &str = "El usuario no coincide con la sesión";
const INVALID_FRAME: &str = "Evento no válido";

pub struct ChatSession {
    rooms: Arc<RoomManager>,
    user: User,
    connection: ConnectionId,
    members: HashMap<Uuid, RoomMember>,
    streams: StreamMap<Uuid, BroadcastStream<RoomEvent>>,
}

impl ChatSession {
    pub fn new(rooms: Arc<RoomManager>, user: User) -> Self {
        Self {
            rooms,
            user,
            connection: Uuid::new_v4(),
            members: HashMap::new(),
            streams: StreamMap::new(),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn has_rooms(&self) -> bool {
        !self.streams.is_empty()
    }

    pub fn is_member(&self, transaction_id: Uuid) -> bool {
        self.members.contains_key(&transaction_id)
    }

    /// Handles one text frame. Returns the events to send back to this
    /// connection only; room broadcasts arrive via [`Self::next_room_event`].
    pub async fn handle_text(&mut self, text: &str) -> Vec<ServerEvent> {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle_event(event).await,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable chat frame");
                vec![ServerEvent::error(INVALID_FRAME)]
            }
        }
    }

    pub async fn handle_event(&mut self, event: ClientEvent) -> Vec<ServerEvent> {
        let result = match event {
            ClientEvent::JoinChat(join) => self.join(join).await,
            ClientEvent::SendMessage(send) => self.send(send).await,
            ClientEvent::Typing(typing) => self.typing(typing).await,
            ClientEvent::LeaveChat(leave) => self.leave(leave).await,
        };

        match result {
            Ok(replies) => replies,
            Err(e) => {
                if let ChatError::Storage(inner) = &e {
                    tracing::error!(user_id = %self.user.id, error = %inner, "chat storage failure");
                }
                vec![ServerEvent::error(e.to_string())]
            }
        }
    }

    fn check_identity(&self, claimed: Option<Uuid>) -> Result<(), ChatError> {
        match claimed {
            Some(id) if id != self.user.id => {
                Err(ChatError::InvalidMessage(IDENTITY_MISMATCH.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn member(&self, transaction_id: Uuid) -> Result<&RoomMember, ChatError> {
        self.members.get(&transaction_id).ok_or(ChatError::NotJoined)
    }

    async fn join(&mut self, join: JoinChat) -> Result<Vec<ServerEvent>, ChatError> {
        self.check_identity(join.user_id)?;

        if let Some(member) = self.members.get(&join.transaction_id) {
            let history = self.rooms.history(member).await?;
            return Ok(vec![ServerEvent::PreviousMessages(history)]);
        }

        let joined = self
            .rooms
            .join(join.transaction_id, self.user.id, self.connection)
            .await?;
        self.streams
            .insert(join.transaction_id, BroadcastStream::new(joined.receiver));
        self.members.insert(join.transaction_id, joined.member);

        Ok(vec![ServerEvent::PreviousMessages(joined.history)])
    }

    async fn send(&mut self, send: SendMessage) -> Result<Vec<ServerEvent>, ChatError> {
        self.check_identity(send.user_id)?;
        let member = self.member(send.transaction_id)?;
        // The sender gets its own copy through the room broadcast.
        self.rooms.send(member, &self.user, &send.content).await?;
        Ok(Vec::new())
    }

    async fn typing(&mut self, typing: Typing) -> Result<Vec<ServerEvent>, ChatError> {
        let member = self.member(typing.transaction_id)?;
        self.rooms.typing(member, &self.user.name).await?;
        Ok(Vec::new())
    }

    async fn leave(&mut self, leave: LeaveChat) -> Result<Vec<ServerEvent>, ChatError> {
        self.streams.remove(&leave.transaction_id);
        if let Some(member) = self.members.remove(&leave.transaction_id) {
            self.rooms.leave(member).await;
        }
        Ok(Vec::new())
    }

    /// Next event from any joined room addressed to this connection.
    /// Returns `None` once no rooms are joined.
    ///
    /// A connection that fell behind its room gets that room's history again
    /// as `previous_messages` in place of the events it missed.
    pub async fn next_room_event(&mut self) -> Option<ServerEvent> {
        while let Some((transaction_id, item)) = self.streams.next().await {
            match item {
                Ok(event) if event.is_for(self.connection) => return Some(event.event),
                Ok(_) => continue,
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    tracing::warn!(
                        transaction_id = %transaction_id,
                        connection = %self.connection,
                        missed,
                        "chat connection lagged behind, resending history"
                    );
                    return Some(self.resync(transaction_id).await);
                }
            }
        }
        None
    }

    async fn resync(&self, transaction_id: Uuid) -> ServerEvent {
        let history = match self.member(transaction_id) {
            Ok(member) => self.rooms.history(member).await,
            Err(e) => Err(e),
        };
        match history {
            Ok(history) => ServerEvent::PreviousMessages(history),
            Err(e) => {
                tracing::error!(
                    transaction_id = %transaction_id,
                    connection = %self.connection,
                    error = %e,
                    "chat history reload failed"
                );
                ServerEvent::error(e.to_string())
            }
        }
    }

    /// Leaves every joined room.
    pub async fn close(mut self) {
        // Receivers must be gone before rooms can be pruned.
        self.streams = StreamMap::new();
        for (_, member) in self.members.drain() {
            self.rooms.leave(member).await;
        }
    }
}
