//! Per-transaction chat rooms.
//!
//! Each room owns a broadcast channel and an ordering lock. Persisting a
//! message and broadcasting it happen under that lock, so every subscriber
//! sees messages in persisted order. Joining subscribes and loads history
//! under the same lock, so nothing is lost or duplicated in between.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use crate::chat::protocol::{ServerEvent, UserTyping};
use crate::domain::{
    Message, NewMessage, NewNotification, NotificationType, User, HISTORY_LIMIT,
};
use crate::ports::{RepositoryError, Store};
use crate::services::Notifier;
use crate::validation::validate_message_content;

const ROOM_CHANNEL_CAPACITY: usize = 256;
const PREVIEW_CHARS: usize = 50;

/// Identifies one live socket. A user may hold several.
pub type ConnectionId = Uuid;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Transacción no encontrada")]
    TransactionNotFound,

    #[error("No tienes permiso para unirte a este chat")]
    NotParticipant,

    #[error("Debes unirte al chat primero")]
    NotJoined,

    #[error("{0}")]
    InvalidMessage(String),

    #[error("Error del servidor")]
    Storage(#[from] RepositoryError),
}

/// What a room broadcasts. `skip` names a connection that must not receive it.
#[derive(Debug, Clone)]
pub struct RoomEvent {
    pub skip: Option<ConnectionId>,
    pub event: ServerEvent,
}

impl RoomEvent {
    pub fn is_for(&self, connection: ConnectionId) -> bool {
        self.skip != Some(connection)
    }
}

struct Room {
    tx: broadcast::Sender<RoomEvent>,
    order: Mutex<()>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(ROOM_CHANNEL_CAPACITY);
        Self {
            tx,
            order: Mutex::new(()),
        }
    }
}

/// Proof that a connection joined a room. Only [`RoomManager::join`] makes one.
#[derive(Debug, Clone)]
pub struct RoomMember {
    transaction_id: Uuid,
    user_id: Uuid,
    counterpart_id: Uuid,
    connection: ConnectionId,
}

impl RoomMember {
    pub fn transaction_id(&self) -> Uuid {
        self.transaction_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }
}

#[derive(Debug)]
pub struct Joined {
    pub member: RoomMember,
    pub receiver: broadcast::Receiver<RoomEvent>,
    /// The newest messages, oldest first.
    pub history: Vec<Message>,
}

pub struct RoomManager {
    store: Arc<dyn Store>,
    notifier: Notifier,
    rooms: RwLock<HashMap<Uuid, Arc<Room>>>,
}

impl RoomManager {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier) -> Self {
        Self {
            store,
            notifier,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub async fn join(
        &self,
        transaction_id: Uuid,
        user_id: Uuid,
        connection: ConnectionId,
    ) -> Result<Joined, ChatError> {
        let tx = self
            .store
            .find_transaction(transaction_id)
            .await?
            .ok_or(ChatError::TransactionNotFound)?;
        let counterpart_id = tx.counterpart_of(user_id).ok_or(ChatError::NotParticipant)?;

        // `pin` keeps the room out of `prune` while we wait for its ordering
        // lock. The registry is never held across that wait.
        let (room, pin) = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .entry(transaction_id)
                .or_insert_with(|| Arc::new(Room::new()))
                .clone();
            let pin = room.tx.subscribe();
            (room, pin)
        };
        let order = room.order.lock().await;
        // Starts after every message already persisted, so history and live
        // events never overlap.
        let receiver = pin.resubscribe();
        drop(pin);

        let history = self.store.recent_messages(transaction_id, HISTORY_LIMIT).await;
        drop(order);

        let history = match history {
            Ok(history) => history,
            Err(e) => {
                drop(receiver);
                self.prune(transaction_id).await;
                return Err(e.into());
            }
        };

        tracing::debug!(
            transaction_id = %transaction_id,
            user_id = %user_id,
            connection = %connection,
            "joined chat room"
        );

        Ok(Joined {
            member: RoomMember {
                transaction_id,
                user_id,
                counterpart_id,
                connection,
            },
            receiver,
            history,
        })
    }

    /// History for a connection that already joined.
    pub async fn history(&self, member: &RoomMember) -> Result<Vec<Message>, ChatError> {
        Ok(self
            .store
            .recent_messages(member.transaction_id, HISTORY_LIMIT)
            .await?)
    }

    async fn room(&self, transaction_id: Uuid) -> Result<Arc<Room>, ChatError> {
        self.rooms
            .read()
            .await
            .get(&transaction_id)
            .cloned()
            .ok_or(ChatError::NotJoined)
    }

    /// Persists and broadcasts to the whole room, sender included, then
    /// notifies the counterpart.
    pub async fn send(&self, member: &RoomMember, sender: &User, content: &str) -> Result<Message, ChatError> {
        validate_message_content(content).map_err(|e| ChatError::InvalidMessage(e.message))?;
        let content = content.trim().to_string();

        let room = self.room(member.transaction_id).await?;
        let message = {
            let _order = room.order.lock().await;
            let message = self
                .store
                .insert_message(&NewMessage::new(
                    member.transaction_id,
                    member.user_id,
                    sender.name.clone(),
                    content,
                ))
                .await?;
            // No receivers is fine: the message is stored either way.
            let _ = room.tx.send(RoomEvent {
                skip: None,
                event: ServerEvent::NewMessage(message.clone()),
            });
            message
        };

        self.notifier.emit(
            NewNotification::new(
                member.counterpart_id,
                NotificationType::ServiceRequest,
                format!("Nuevo mensaje de {}", sender.name),
                preview(&message.content),
            )
            .with_transaction(member.transaction_id),
        );

        Ok(message)
    }

    /// Tells every other connection in the room that `member` is typing.
    pub async fn typing(&self, member: &RoomMember, user_name: &str) -> Result<(), ChatError> {
        let room = self.room(member.transaction_id).await?;
        let _ = room.tx.send(RoomEvent {
            skip: Some(member.connection),
            event: ServerEvent::UserTyping(UserTyping {
                transaction_id: member.transaction_id,
                user_id: member.user_id,
                user_name: user_name.to_string(),
            }),
        });
        Ok(())
    }

    /// Call after dropping the member's receiver.
    pub async fn leave(&self, member: RoomMember) {
        tracing::debug!(
            transaction_id = %member.transaction_id,
            connection = %member.connection,
            "left chat room"
        );
        self.prune(member.transaction_id).await;
    }

    async fn prune(&self, transaction_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        let empty = rooms
            .get(&transaction_id)
            .map_or(false, |room| room.tx.receiver_count() == 0);
        if empty {
            rooms.remove(&transaction_id);
        }
    }

    pub async fn active_rooms(&self) -> usize {
        self.rooms.read().await.len()
    }
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_messages() {
        assert_eq!(preview("hola"), "hola");
        let long = "a".repeat(60);
        assert_eq!(preview(&long), format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn room_event_skips_origin() {
        let origin = Uuid::new_v4();
        let event = RoomEvent {
            skip: Some(origin),
            event: ServerEvent::error("x"),
        };
        assert!(!event.is_for(origin));
        assert!(event.is_for(Uuid::new_v4()));
    }
}
