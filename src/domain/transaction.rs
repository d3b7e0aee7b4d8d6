//! Transaction domain entity.
//! A currency transfer between a client and a provider for one service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{RuleViolation, Service, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

/// Name fields are snapshots taken at request time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_title: String,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub client_id: Uuid,
    pub client_name: String,
    pub trueqq_amount: i64,
    pub status: TransactionStatus,
    pub chat_active: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.client_id == user_id || self.provider_id == user_id
    }

    /// The other participant, or `None` if `user_id` is not part of it.
    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.provider_id {
            Some(self.client_id)
        } else if user_id == self.client_id {
            Some(self.provider_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: Uuid,
    pub service_id: Uuid,
    pub service_title: String,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub client_id: Uuid,
    pub client_name: String,
    pub trueqq_amount: i64,
    pub status: TransactionStatus,
    pub chat_active: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    /// Immediate settlement: the row is born completed with its chat open.
    pub fn settled(service: &Service, client: &User, provider: &User) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            service_id: service.id,
            service_title: service.title.clone(),
            provider_id: provider.id,
            provider_name: provider.name.clone(),
            client_id: client.id,
            client_name: client.name.clone(),
            trueqq_amount: service.trueqq_price,
            status: TransactionStatus::Completed,
            chat_active: true,
            completed_at: Some(now),
            created_at: now,
        }
    }

    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: self.id,
            service_id: self.service_id,
            service_title: self.service_title,
            provider_id: self.provider_id,
            provider_name: self.provider_name,
            client_id: self.client_id,
            client_name: self.client_name,
            trueqq_amount: self.trueqq_amount,
            status: self.status,
            chat_active: self.chat_active,
            completed_at: self.completed_at,
            created_at: self.created_at,
        }
    }
}

/// Rules a service request must pass. Stores call this inside their atomic
/// unit, after locking the rows involved.
pub fn check_service_request(service: &Service, client: &User) -> Result<(), RuleViolation> {
    if !service.is_active {
        return Err(RuleViolation::ServiceUnavailable);
    }
    if service.provider_id == client.id {
        return Err(RuleViolation::SelfTransaction);
    }
    if client.trueqq_balance < service.trueqq_price {
        return Err(RuleViolation::InsufficientFunds {
            required: service.trueqq_price,
            available: client.trueqq_balance,
        });
    }
    Ok(())
}

/// Outcome of a committed service request.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub transaction: Transaction,
    pub client_balance: i64,
    pub provider_balance: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionDirection {
    /// The user paid (client side).
    Sent,
    /// The user was paid (provider side).
    Received,
    #[default]
    All,
}

impl TransactionDirection {
    /// Unknown or missing values mean "all".
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("sent") => TransactionDirection::Sent,
            Some("received") => TransactionDirection::Received,
            _ => TransactionDirection::All,
        }
    }

    pub fn includes(self, tx: &Transaction, user_id: Uuid) -> bool {
        match self {
            TransactionDirection::Sent => tx.client_id == user_id,
            TransactionDirection::Received => tx.provider_id == user_id,
            TransactionDirection::All => tx.is_participant(user_id),
        }
    }
}

/// Completed-transaction aggregates for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionTotals {
    pub total_sent: i64,
    pub total_received: i64,
    pub sent_count: i64,
    pub received_count: i64,
}

impl TransactionTotals {
    pub fn accumulate(&mut self, tx: &Transaction, user_id: Uuid) {
        if tx.status != TransactionStatus::Completed {
            return;
        }
        if tx.client_id == user_id {
            self.total_sent += tx.trueqq_amount;
            self.sent_count += 1;
        }
        if tx.provider_id == user_id {
            self.total_received += tx.trueqq_amount;
            self.received_count += 1;
        }
    }
}
