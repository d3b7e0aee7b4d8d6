use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ServiceRequest,
    ReviewReceived,
    TransactionComplete,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::ServiceRequest => "service_request",
            NotificationType::ReviewReceived => "review_received",
            NotificationType::TransactionComplete => "transaction_complete",
        }
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service_request" => Ok(NotificationType::ServiceRequest),
            "review_received" => Ok(NotificationType::ReviewReceived),
            "transaction_complete" => Ok(NotificationType::TransactionComplete),
            other => Err(format!("unknown notification type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related_service: Option<Uuid>,
    pub related_transaction: Option<Uuid>,
    pub related_review: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related_service: Option<Uuid>,
    pub related_transaction: Option<Uuid>,
    pub related_review: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn new(user_id: Uuid, kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            related_service: None,
            related_transaction: None,
            related_review: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_service(mut self, id: Uuid) -> Self {
        self.related_service = Some(id);
        self
    }

    pub fn with_transaction(mut self, id: Uuid) -> Self {
        self.related_transaction = Some(id);
        self
    }

    pub fn with_review(mut self, id: Uuid) -> Self {
        self.related_review = Some(id);
        self
    }

    pub fn into_notification(self) -> Notification {
        Notification {
            id: self.id,
            user_id: self.user_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            related_service: self.related_service,
            related_transaction: self.related_transaction,
            related_review: self.related_review,
            read: false,
            created_at: self.created_at,
        }
    }
}
