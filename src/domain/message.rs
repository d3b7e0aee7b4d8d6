use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const MAX_MESSAGE_LEN: usize = 1000;
/// How many of the newest messages a room hands out as history.
pub const HISTORY_LIMIT: i64 = 100;

/// Chat line inside a transaction's room. Immutable once stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    /// Persisted order within the store; later messages have larger values.
    pub seq: i64,
    pub transaction_id: Uuid,
    #[serde(rename = "sender")]
    pub sender_id: Uuid,
    /// Snapshot of the sender's name when the message was written.
    pub sender_name: String,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn new(transaction_id: Uuid, sender_id: Uuid, sender_name: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            sender_id,
            sender_name,
            content,
            created_at: Utc::now(),
        }
    }

    pub fn into_message(self, seq: i64) -> Message {
        Message {
            id: self.id,
            seq,
            transaction_id: self.transaction_id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            content: self.content,
            read: false,
            created_at: self.created_at,
        }
    }
}
