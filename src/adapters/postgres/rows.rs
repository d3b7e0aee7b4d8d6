//! Internal row types for SQLx. Not exposed outside the adapter.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Community, Message, Notification, Review, Service, Transaction, User,
};
use crate::ports::{RepositoryError, RepositoryResult};

pub(super) const USER_COLUMNS: &str =
    "id, name, email, password_hash, account_type, trueqq_balance, created_at";

pub(super) const COMMUNITY_COLUMNS: &str = "c.id, c.name, c.description, c.icon, c.color, \
     c.services_count, c.is_active, c.created_at, \
     (SELECT COUNT(*) FROM community_members m WHERE m.community_id = c.id) AS members_count";

pub(super) const SERVICE_COLUMNS: &str = "id, title, description, category, trueqq_price, \
     provider_id, provider_name, community_id, is_active, rating, reviews_count, \
     times_requested, created_at, updated_at";

pub(super) const TRANSACTION_COLUMNS: &str = "id, service_id, service_title, provider_id, \
     provider_name, client_id, client_name, trueqq_amount, status, chat_active, \
     completed_at, created_at";

pub(super) const MESSAGE_COLUMNS: &str =
    "id, seq, transaction_id, sender_id, sender_name, content, read, created_at";

pub(super) const REVIEW_COLUMNS: &str = "id, transaction_id, service_id, service_title, \
     provider_id, client_id, client_name, rating, comment, created_at";

pub(super) const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, message, \
     related_service_id, related_transaction_id, related_review_id, read, created_at";

fn corrupt(column: &str, e: String) -> RepositoryError {
    RepositoryError::Storage(format!("invalid value in column {}: {}", column, e))
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    account_type: String,
    trueqq_balance: i64,
    created_at: DateTime<Utc>,
}

impl UserRow {
    pub(super) fn into_domain(self) -> RepositoryResult<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            account_type: self
                .account_type
                .parse()
                .map_err(|e| corrupt("account_type", e))?,
            trueqq_balance: self.trueqq_balance,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct CommunityRow {
    id: Uuid,
    name: String,
    description: String,
    icon: String,
    color: String,
    services_count: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    members_count: i64,
}

impl CommunityRow {
    pub(super) fn into_domain(self) -> Community {
        Community {
            id: self.id,
            name: self.name,
            description: self.description,
            icon: self.icon,
            color: self.color,
            members_count: self.members_count,
            services_count: self.services_count,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ServiceRow {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    trueqq_price: i64,
    provider_id: Uuid,
    provider_name: String,
    community_id: Uuid,
    is_active: bool,
    rating: f64,
    reviews_count: i64,
    times_requested: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRow {
    pub(super) fn into_domain(self) -> Service {
        Service {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            trueqq_price: self.trueqq_price,
            provider_id: self.provider_id,
            provider_name: self.provider_name,
            community_id: self.community_id,
            is_active: self.is_active,
            rating: self.rating,
            reviews_count: self.reviews_count,
            times_requested: self.times_requested,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct TransactionRow {
    id: Uuid,
    service_id: Uuid,
    service_title: String,
    provider_id: Uuid,
    provider_name: String,
    client_id: Uuid,
    client_name: String,
    trueqq_amount: i64,
    status: String,
    chat_active: bool,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    pub(super) fn into_domain(self) -> RepositoryResult<Transaction> {
        Ok(Transaction {
            id: self.id,
            service_id: self.service_id,
            service_title: self.service_title,
            provider_id: self.provider_id,
            provider_name: self.provider_name,
            client_id: self.client_id,
            client_name: self.client_name,
            trueqq_amount: self.trueqq_amount,
            status: self.status.parse().map_err(|e| corrupt("status", e))?,
            chat_active: self.chat_active,
            completed_at: self.completed_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct MessageRow {
    id: Uuid,
    seq: i64,
    transaction_id: Uuid,
    sender_id: Uuid,
    sender_name: String,
    content: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    pub(super) fn into_domain(self) -> Message {
        Message {
            id: self.id,
            seq: self.seq,
            transaction_id: self.transaction_id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            content: self.content,
            read: self.read,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ReviewRow {
    id: Uuid,
    transaction_id: Uuid,
    service_id: Uuid,
    service_title: String,
    provider_id: Uuid,
    client_id: Uuid,
    client_name: String,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

impl ReviewRow {
    pub(super) fn into_domain(self) -> Review {
        Review {
            id: self.id,
            transaction_id: self.transaction_id,
            service_id: self.service_id,
            service_title: self.service_title,
            provider_id: self.provider_id,
            client_id: self.client_id,
            client_name: self.client_name,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    message: String,
    related_service_id: Option<Uuid>,
    related_transaction_id: Option<Uuid>,
    related_review_id: Option<Uuid>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    pub(super) fn into_domain(self) -> RepositoryResult<Notification> {
        Ok(Notification {
            id: self.id,
            user_id: self.user_id,
            kind: self.kind.parse().map_err(|e| corrupt("kind", e))?,
            title: self.title,
            message: self.message,
            related_service: self.related_service_id,
            related_transaction: self.related_transaction_id,
            related_review: self.related_review_id,
            read: self.read,
            created_at: self.created_at,
        })
    }
}

/// Converts a batch of rows whose conversion can fail.
pub(super) fn collect_rows<R, T>(
    rows: Vec<R>,
    convert: impl Fn(R) -> RepositoryResult<T>,
) -> RepositoryResult<Vec<T>> {
    rows.into_iter().map(convert).collect()
}
