//! WebSocket frames: `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Message;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinChat(JoinChat),
    SendMessage(SendMessage),
    Typing(Typing),
    LeaveChat(LeaveChat),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinChat {
    pub transaction_id: Uuid,
    /// Optional; when present it must match the authenticated user.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub transaction_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Ignored; names come from the stored user.
    #[serde(default)]
    pub user_name: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Typing {
    pub transaction_id: Uuid,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveChat {
    pub transaction_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    PreviousMessages(Vec<Message>),
    NewMessage(Message),
    UserTyping(UserTyping),
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTyping {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_chat_frame() {
        let id = Uuid::new_v4();
        let frame = format!(r#"{{"event":"join_chat","data":{{"transactionId":"{}"}}}}"#, id);
        let parsed: ClientEvent = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            parsed,
            ClientEvent::JoinChat(JoinChat {
                transaction_id: id,
                user_id: None
            })
        );
    }

    #[test]
    fn parses_send_message_with_client_name() {
        let id = Uuid::new_v4();
        let frame = format!(
            r#"{{"event":"send_message","data":{{"transactionId":"{}","userName":"Ana","content":"hola"}}}}"#,
            id
        );
        match serde_json::from_str::<ClientEvent>(&frame).unwrap() {
            ClientEvent::SendMessage(m) => {
                assert_eq!(m.content, "hola");
                assert_eq!(m.user_name.as_deref(), Some("Ana"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_event() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"shout","data":{}}"#).is_err());
    }

    #[test]
    fn serializes_error_frame() {
        let json = serde_json::to_value(ServerEvent::error("nope")).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["message"], "nope");
    }
}
