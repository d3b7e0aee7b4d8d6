//! In-memory implementation of the storage ports.
//!
//! One `RwLock` guards the whole state, so every operation (including the
//! service-request settlement) is atomic with respect to every other one.
//! Collections are insertion-ordered vectors; "newest first" means reverse
//! insertion order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    check_service_request, Community, MemberSummary, Message, NewCommunity, NewMessage,
    NewNotification, NewReview, NewService, NewTransaction, NewUser, Notification, Review,
    RuleViolation, Service, ServiceFilter, ServiceUpdate, Settlement, Transaction,
    TransactionDirection, TransactionStatus, TransactionTotals, User,
};
use crate::ports::{
    CommunityRepository, MessageRepository, NotificationRepository, RepositoryError,
    RepositoryResult, ReviewRepository, ServiceRepository, Store, TransactionRepository,
    UserRepository,
};

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    communities: Vec<Community>,
    members: HashMap<Uuid, Vec<Uuid>>,
    services: Vec<Service>,
    transactions: Vec<Transaction>,
    messages: Vec<Message>,
    next_seq: i64,
    reviews: Vec<Review>,
    notifications: Vec<Notification>,
}

impl MemoryState {
    fn service_mut(&mut self, id: Uuid) -> Option<&mut Service> {
        self.services.iter_mut().find(|s| s.id == id)
    }

    fn community_mut(&mut self, id: Uuid) -> Option<&mut Community> {
        self.communities.iter_mut().find(|c| c.id == id)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(entity: &str, id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("{} {}", entity, id))
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(RuleViolation::EmailTaken.into());
        }
        let user = user.clone().into_user();
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl CommunityRepository for InMemoryStore {
    async fn list_communities(&self) -> RepositoryResult<Vec<Community>> {
        let state = self.state.read().await;
        let mut communities: Vec<Community> =
            state.communities.iter().filter(|c| c.is_active).cloned().collect();
        communities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(communities)
    }

    async fn find_community(&self, id: Uuid) -> RepositoryResult<Option<Community>> {
        let state = self.state.read().await;
        Ok(state.communities.iter().find(|c| c.id == id).cloned())
    }

    async fn community_members(&self, id: Uuid) -> RepositoryResult<Vec<MemberSummary>> {
        let state = self.state.read().await;
        let ids = state.members.get(&id).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|uid| state.users.iter().find(|u| u.id == *uid))
            .map(|u| MemberSummary {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .collect())
    }

    async fn join_community(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<i64> {
        let mut state = self.state.write().await;
        if !state.communities.iter().any(|c| c.id == id) {
            return Err(not_found("community", id));
        }
        let members = state.members.entry(id).or_default();
        if members.contains(&user_id) {
            return Err(RuleViolation::AlreadyMember.into());
        }
        members.push(user_id);
        let count = members.len() as i64;
        if let Some(community) = state.community_mut(id) {
            community.members_count = count;
        }
        Ok(count)
    }

    async fn communities_of_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Community>> {
        let state = self.state.read().await;
        Ok(state
            .communities
            .iter()
            .filter(|c| {
                state
                    .members
                    .get(&c.id)
                    .map_or(false, |members| members.contains(&user_id))
            })
            .cloned()
            .collect())
    }

    async fn upsert_community(&self, community: &NewCommunity) -> RepositoryResult<Community> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.communities.iter_mut().find(|c| c.name == community.name) {
            existing.description = community.description.clone();
            existing.icon = community.icon.clone();
            existing.color = community.color.clone();
            return Ok(existing.clone());
        }
        let created = Community {
            id: Uuid::new_v4(),
            name: community.name.clone(),
            description: community.description.clone(),
            icon: community.icon.clone(),
            color: community.color.clone(),
            members_count: 0,
            services_count: 0,
            is_active: true,
            created_at: Utc::now(),
        };
        state.communities.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl ServiceRepository for InMemoryStore {
    async fn insert_service(&self, service: &NewService) -> RepositoryResult<Service> {
        let mut state = self.state.write().await;
        let community = state
            .community_mut(service.community_id)
            .ok_or_else(|| not_found("community", service.community_id))?;
        community.services_count += 1;
        let service = service.clone().into_service();
        state.services.push(service.clone());
        Ok(service)
    }

    async fn find_service(&self, id: Uuid) -> RepositoryResult<Option<Service>> {
        let state = self.state.read().await;
        Ok(state.services.iter().find(|s| s.id == id).cloned())
    }

    async fn search_services(&self, filter: &ServiceFilter) -> RepositoryResult<Vec<Service>> {
        let state = self.state.read().await;
        Ok(state
            .services
            .iter()
            .rev()
            .filter(|s| s.matches(filter))
            .cloned()
            .collect())
    }

    async fn update_service(&self, id: Uuid, update: &ServiceUpdate) -> RepositoryResult<Service> {
        let mut state = self.state.write().await;
        let service = state.service_mut(id).ok_or_else(|| not_found("service", id))?;
        update.apply(service);
        Ok(service.clone())
    }

    async fn deactivate_service(&self, id: Uuid) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let service = state.service_mut(id).ok_or_else(|| not_found("service", id))?;
        service.is_active = false;
        service.updated_at = Utc::now();
        Ok(())
    }

    async fn set_service_rating(&self, id: Uuid, rating: f64, reviews_count: i64) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let service = state.service_mut(id).ok_or_else(|| not_found("service", id))?;
        service.rating = rating;
        service.reviews_count = reviews_count;
        Ok(())
    }

    async fn services_of_provider(&self, provider_id: Uuid) -> RepositoryResult<Vec<Service>> {
        let state = self.state.read().await;
        Ok(state
            .services
            .iter()
            .filter(|s| s.provider_id == provider_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn settle_service_request(&self, service_id: Uuid, client_id: Uuid) -> RepositoryResult<Settlement> {
        let mut state = self.state.write().await;

        let service_idx = state
            .services
            .iter()
            .position(|s| s.id == service_id)
            .ok_or_else(|| not_found("service", service_id))?;
        let client_idx = state
            .users
            .iter()
            .position(|u| u.id == client_id)
            .ok_or_else(|| not_found("user", client_id))?;

        check_service_request(&state.services[service_idx], &state.users[client_idx])?;

        let provider_id = state.services[service_idx].provider_id;
        let provider_idx = state
            .users
            .iter()
            .position(|u| u.id == provider_id)
            .ok_or_else(|| not_found("user", provider_id))?;

        // Every check has passed; nothing below can fail.
        let tx = NewTransaction::settled(
            &state.services[service_idx],
            &state.users[client_idx],
            &state.users[provider_idx],
        )
        .into_transaction();
        let price = tx.trueqq_amount;

        state.users[client_idx].trueqq_balance -= price;
        state.users[provider_idx].trueqq_balance += price;
        state.services[service_idx].times_requested += 1;
        state.transactions.push(tx.clone());

        let client_balance = state.users[client_idx].trueqq_balance;
        let provider_balance = state.users[provider_idx].trueqq_balance;

        Ok(Settlement {
            transaction: tx,
            client_balance,
            provider_balance,
        })
    }

    async fn find_transaction(&self, id: Uuid) -> RepositoryResult<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn list_transactions(&self, user_id: Uuid, direction: TransactionDirection) -> RepositoryResult<Vec<Transaction>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| direction.includes(t, user_id))
            .cloned()
            .collect())
    }

    async fn complete_transaction(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<Transaction> {
        let mut state = self.state.write().await;
        let tx = state
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("transaction", id))?;
        if tx.status == TransactionStatus::Completed {
            return Err(RuleViolation::AlreadyCompleted.into());
        }
        tx.status = TransactionStatus::Completed;
        tx.completed_at = Some(at);
        Ok(tx.clone())
    }

    async fn transaction_totals(&self, user_id: Uuid) -> RepositoryResult<TransactionTotals> {
        let state = self.state.read().await;
        let mut totals = TransactionTotals::default();
        for tx in &state.transactions {
            totals.accumulate(tx, user_id);
        }
        Ok(totals)
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn insert_message(&self, message: &NewMessage) -> RepositoryResult<Message> {
        let mut state = self.state.write().await;
        if !state.transactions.iter().any(|t| t.id == message.transaction_id) {
            return Err(not_found("transaction", message.transaction_id));
        }
        state.next_seq += 1;
        let stored = message.clone().into_message(state.next_seq);
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn recent_messages(&self, transaction_id: Uuid, limit: i64) -> RepositoryResult<Vec<Message>> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        let mut recent: Vec<Message> = state
            .messages
            .iter()
            .rev()
            .filter(|m| m.transaction_id == transaction_id)
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        Ok(recent)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn insert_review(&self, review: &NewReview) -> RepositoryResult<Review> {
        let mut state = self.state.write().await;
        if state.reviews.iter().any(|r| r.transaction_id == review.transaction_id) {
            return Err(RuleViolation::DuplicateReview.into());
        }
        let review = review.clone().into_review();
        state.reviews.push(review.clone());
        Ok(review)
    }

    async fn review_for_transaction(&self, transaction_id: Uuid) -> RepositoryResult<Option<Review>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .iter()
            .find(|r| r.transaction_id == transaction_id)
            .cloned())
    }

    async fn reviews_for_service(&self, service_id: Uuid) -> RepositoryResult<Vec<Review>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .iter()
            .rev()
            .filter(|r| r.service_id == service_id)
            .cloned()
            .collect())
    }

    async fn reviews_for_provider(&self, provider_id: Uuid) -> RepositoryResult<Vec<Review>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .iter()
            .rev()
            .filter(|r| r.provider_id == provider_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert_notification(&self, notification: &NewNotification) -> RepositoryResult<Notification> {
        let mut state = self.state.write().await;
        let stored = notification.clone().into_notification();
        state.notifications.push(stored.clone());
        Ok(stored)
    }

    async fn list_notifications(&self, user_id: Uuid, unread_only: bool, limit: i64) -> RepositoryResult<Vec<Notification>> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_unread(&self, user_id: Uuid) -> RepositoryResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }

    async fn find_notification(&self, id: Uuid) -> RepositoryResult<Option<Notification>> {
        let state = self.state.read().await;
        Ok(state.notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn mark_notification_read(&self, id: Uuid) -> RepositoryResult<Notification> {
        let mut state = self.state.write().await;
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| not_found("notification", id))?;
        notification.read = true;
        Ok(notification.clone())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> RepositoryResult<u64> {
        let mut state = self.state.write().await;
        let mut flipped = 0;
        for n in state.notifications.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
            n.read = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
