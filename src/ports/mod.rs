//! Storage ports. Services depend on these traits; `adapters` provides the
//! Postgres and in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Community, MemberSummary, Message, NewCommunity, NewMessage, NewNotification, NewReview,
    NewService, NewUser, Notification, Review, RuleViolation, Service, ServiceFilter,
    ServiceUpdate, Settlement, Transaction, TransactionDirection, TransactionTotals, User,
};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `RuleViolation::EmailTaken` when the email is in use.
    async fn insert_user(&self, user: &NewUser) -> RepositoryResult<User>;
    async fn find_user(&self, id: Uuid) -> RepositoryResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
}

#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Active communities ordered by name.
    async fn list_communities(&self) -> RepositoryResult<Vec<Community>>;
    async fn find_community(&self, id: Uuid) -> RepositoryResult<Option<Community>>;
    async fn community_members(&self, id: Uuid) -> RepositoryResult<Vec<MemberSummary>>;
    /// Returns the new member count. Fails with `RuleViolation::AlreadyMember`.
    async fn join_community(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<i64>;
    async fn communities_of_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Community>>;
    /// Inserts, or refreshes description/icon/color of an existing name.
    async fn upsert_community(&self, community: &NewCommunity) -> RepositoryResult<Community>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Also bumps the owning community's service counter.
    async fn insert_service(&self, service: &NewService) -> RepositoryResult<Service>;
    async fn find_service(&self, id: Uuid) -> RepositoryResult<Option<Service>>;
    /// Active listings matching `filter`, newest first.
    async fn search_services(&self, filter: &ServiceFilter) -> RepositoryResult<Vec<Service>>;
    async fn update_service(&self, id: Uuid, update: &ServiceUpdate) -> RepositoryResult<Service>;
    async fn deactivate_service(&self, id: Uuid) -> RepositoryResult<()>;
    async fn set_service_rating(&self, id: Uuid, rating: f64, reviews_count: i64) -> RepositoryResult<()>;
    async fn services_of_provider(&self, provider_id: Uuid) -> RepositoryResult<Vec<Service>>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Debit the client, credit the provider, count the request and record the
    /// transaction as one atomic unit. The rules in
    /// `domain::check_service_request` are evaluated inside that unit; on any
    /// failure nothing is written.
    async fn settle_service_request(&self, service_id: Uuid, client_id: Uuid) -> RepositoryResult<Settlement>;
    async fn find_transaction(&self, id: Uuid) -> RepositoryResult<Option<Transaction>>;
    /// Newest first.
    async fn list_transactions(&self, user_id: Uuid, direction: TransactionDirection) -> RepositoryResult<Vec<Transaction>>;
    /// Fails with `RuleViolation::AlreadyCompleted` if it already was.
    async fn complete_transaction(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<Transaction>;
    async fn transaction_totals(&self, user_id: Uuid) -> RepositoryResult<TransactionTotals>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert_message(&self, message: &NewMessage) -> RepositoryResult<Message>;
    /// The newest `limit` messages, returned oldest first.
    async fn recent_messages(&self, transaction_id: Uuid, limit: i64) -> RepositoryResult<Vec<Message>>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Fails with `RuleViolation::DuplicateReview` for a second review of the
    /// same transaction.
    async fn insert_review(&self, review: &NewReview) -> RepositoryResult<Review>;
    async fn review_for_transaction(&self, transaction_id: Uuid) -> RepositoryResult<Option<Review>>;
    async fn reviews_for_service(&self, service_id: Uuid) -> RepositoryResult<Vec<Review>>;
    async fn reviews_for_provider(&self, provider_id: Uuid) -> RepositoryResult<Vec<Review>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &NewNotification) -> RepositoryResult<Notification>;
    async fn list_notifications(&self, user_id: Uuid, unread_only: bool, limit: i64) -> RepositoryResult<Vec<Notification>>;
    async fn count_unread(&self, user_id: Uuid) -> RepositoryResult<i64>;
    async fn find_notification(&self, id: Uuid) -> RepositoryResult<Option<Notification>>;
    async fn mark_notification_read(&self, id: Uuid) -> RepositoryResult<Notification>;
    /// Returns how many rows flipped.
    async fn mark_all_read(&self, user_id: Uuid) -> RepositoryResult<u64>;
}

/// Everything the application needs from persistence.
#[async_trait]
pub trait Store:
    UserRepository
    + CommunityRepository
    + ServiceRepository
    + TransactionRepository
    + MessageRepository
    + ReviewRepository
    + NotificationRepository
{
    async fn ping(&self) -> RepositoryResult<()>;
}
