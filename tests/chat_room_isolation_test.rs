use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast::error::TryRecvError, Notify, Semaphore};
use uuid::Uuid;

use trueqq_core::adapters::InMemoryStore;
use trueqq_core::chat::RoomManager;
use trueqq_core::db::seed_communities;
use trueqq_core::domain::{
    AccountType, Community, MemberSummary, Message, NewCommunity, NewMessage, NewNotification,
    NewReview, NewService, NewUser, Notification, Review, Service, ServiceFilter, ServiceUpdate,
    Settlement, Transaction, TransactionDirection, TransactionTotals, User,
};
use trueqq_core::ports::{
    CommunityRepository, MessageRepository, NotificationRepository, RepositoryResult,
    ReviewRepository, ServiceRepository, Store, TransactionRepository, UserRepository,
};
use trueqq_core::services::Notifier;

const SLOW: &str = "slow";

/// In-memory store whose inserts of the message `"slow"` wait until the
/// test opens the gate.
struct GatedStore {
    inner: InMemoryStore,
    entered: Notify,
    gate: Semaphore,
}

impl GatedStore {
    fn open(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl UserRepository for GatedStore {
    async fn insert_user(&self, user: &NewUser) -> RepositoryResult<User> {
        self.inner.insert_user(user).await
    }
    async fn find_user(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        self.inner.find_user(id).await
    }
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }
}

#[async_trait]
impl CommunityRepository for GatedStore {
    async fn list_communities(&self) -> RepositoryResult<Vec<Community>> {
        self.inner.list_communities().await
    }
    async fn find_community(&self, id: Uuid) -> RepositoryResult<Option<Community>> {
        self.inner.find_community(id).await
    }
    async fn community_members(&self, id: Uuid) -> RepositoryResult<Vec<MemberSummary>> {
        self.inner.community_members(id).await
    }
    async fn join_community(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<i64> {
        self.inner.join_community(id, user_id).await
    }
    async fn communities_of_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Community>> {
        self.inner.communities_of_user(user_id).await
    }
    async fn upsert_community(&self, community: &NewCommunity) -> RepositoryResult<Community> {
        self.inner.upsert_community(community).await
    }
}

#[async_trait]
impl ServiceRepository for GatedStore {
    async fn insert_service(&self, service: &NewService) -> RepositoryResult<Service> {
        self.inner.insert_service(service).await
    }
    async fn find_service(&self, id: Uuid) -> RepositoryResult<Option<Service>> {
        self.inner.find_service(id).await
    }
    async fn search_services(&self, filter: &ServiceFilter) -> RepositoryResult<Vec<Service>> {
        self.inner.search_services(filter).await
    }
    async fn update_service(&self, id: Uuid, update: &ServiceUpdate) -> RepositoryResult<Service> {
        self.inner.update_service(id, update).await
    }
    async fn deactivate_service(&self, id: Uuid) -> RepositoryResult<()> {
        self.inner.deactivate_service(id).await
    }
    async fn set_service_rating(&self, id: Uuid, rating: f64, reviews_count: i64) -> RepositoryResult<()> {
        self.inner.set_service_rating(id, rating, reviews_count).await
    }
    async fn services_of_provider(&self, provider_id: Uuid) -> RepositoryResult<Vec<Service>> {
        self.inner.services_of_provider(provider_id).await
    }
}

#[async_trait]
impl TransactionRepository for GatedStore {
    async fn settle_service_request(&self, service_id: Uuid, client_id: Uuid) -> RepositoryResult<Settlement> {
        self.inner.settle_service_request(service_id, client_id).await
    }
    async fn find_transaction(&self, id: Uuid) -> RepositoryResult<Option<Transaction>> {
        self.inner.find_transaction(id).await
    }
    async fn list_transactions(&self, user_id: Uuid, direction: TransactionDirection) -> RepositoryResult<Vec<Transaction>> {
        self.inner.list_transactions(user_id, direction).await
    }
    async fn complete_transaction(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<Transaction> {
        self.inner.complete_transaction(id, at).await
    }
    async fn transaction_totals(&self, user_id: Uuid) -> RepositoryResult<TransactionTotals> {
        self.inner.transaction_totals(user_id).await
    }
}

#[async_trait]
impl MessageRepository for GatedStore {
    async fn insert_message(&self, message: &NewMessage) -> RepositoryResult<Message> {
        if message.content == SLOW {
            self.entered.notify_one();
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }
        self.inner.insert_message(message).await
    }
    async fn recent_messages(&self, transaction_id: Uuid, limit: i64) -> RepositoryResult<Vec<Message>> {
        self.inner.recent_messages(transaction_id, limit).await
    }
}

#[async_trait]
impl ReviewRepository for GatedStore {
    async fn insert_review(&self, review: &NewReview) -> RepositoryResult<Review> {
        self.inner.insert_review(review).await
    }
    async fn review_for_transaction(&self, transaction_id: Uuid) -> RepositoryResult<Option<Review>> {
        self.inner.review_for_transaction(transaction_id).await
    }
    async fn reviews_for_service(&self, service_id: Uuid) -> RepositoryResult<Vec<Review>> {
        self.inner.reviews_for_service(service_id).await
    }
    async fn reviews_for_provider(&self, provider_id: Uuid) -> RepositoryResult<Vec<Review>> {
        self.inner.reviews_for_provider(provider_id).await
    }
}

#[async_trait]
impl NotificationRepository for GatedStore {
    async fn insert_notification(&self, notification: &NewNotification) -> RepositoryResult<Notification> {
        self.inner.insert_notification(notification).await
    }
    async fn list_notifications(&self, user_id: Uuid, unread_only: bool, limit: i64) -> RepositoryResult<Vec<Notification>> {
        self.inner.list_notifications(user_id, unread_only, limit).await
    }
    async fn count_unread(&self, user_id: Uuid) -> RepositoryResult<i64> {
        self.inner.count_unread(user_id).await
    }
    async fn find_notification(&self, id: Uuid) -> RepositoryResult<Option<Notification>> {
        self.inner.find_notification(id).await
    }
    async fn mark_notification_read(&self, id: Uuid) -> RepositoryResult<Notification> {
        self.inner.mark_notification_read(id).await
    }
    async fn mark_all_read(&self, user_id: Uuid) -> RepositoryResult<u64> {
        self.inner.mark_all_read(user_id).await
    }
}

#[async_trait]
impl Store for GatedStore {
    async fn ping(&self) -> RepositoryResult<()> {
        self.inner.ping().await
    }
}

async fn user(store: &GatedStore, name: &str) -> User {
    let new = NewUser::new(
        name.to_string(),
        format!("{}@trueqq.test", name.to_lowercase()),
        "not-a-real-hash".to_string(),
        AccountType::Freemium,
    );
    store.insert_user(&new).await.unwrap()
}

#[tokio::test]
async fn test_slow_write_in_one_room_does_not_stall_other_rooms() {
    let memory = InMemoryStore::new();
    seed_communities(&memory).await.unwrap();
    let gated = Arc::new(GatedStore {
        inner: memory,
        entered: Notify::new(),
        gate: Semaphore::new(0),
    });
    let store: Arc<dyn Store> = gated.clone();

    let client = user(&gated, "Ana").await;
    let provider = user(&gated, "Beto").await;
    let community = gated.list_communities().await.unwrap()[0].id;
    let service = gated
        .insert_service(&NewService {
            id: Uuid::new_v4(),
            title: "Clases de guitarra".to_string(),
            description: "Una hora semanal".to_string(),
            category: "Música".to_string(),
            trueqq_price: 100,
            provider_id: provider.id,
            provider_name: provider.name.clone(),
            community_id: community,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    let room_a = gated.settle_service_request(service.id, client.id).await.unwrap().transaction;
    let room_b = gated.settle_service_request(service.id, client.id).await.unwrap().transaction;

    let rooms = Arc::new(RoomManager::new(store.clone(), Notifier::spawn(store, 64)));
    let in_a = rooms.join(room_a.id, client.id, Uuid::new_v4()).await.unwrap();
    let in_b = rooms.join(room_b.id, client.id, Uuid::new_v4()).await.unwrap();

    let slow_send = {
        let rooms = rooms.clone();
        let member = in_a.member.clone();
        let client = client.clone();
        tokio::spawn(async move { rooms.send(&member, &client, SLOW).await })
    };
    gated.entered.notified().await;

    let late_join = {
        let rooms = rooms.clone();
        let (room_id, provider_id) = (room_a.id, provider.id);
        tokio::spawn(async move { rooms.join(room_id, provider_id, Uuid::new_v4()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let sent = tokio::time::timeout(
        Duration::from_secs(2),
        rooms.send(&in_b.member, &client, "hola"),
    )
    .await
    .expect("room B was blocked by a slow write in room A")
    .unwrap();
    assert_eq!(sent.content, "hola");
    assert!(tokio::time::timeout(
        Duration::from_secs(2),
        rooms.typing(&in_b.member, &client.name)
    )
    .await
    .is_ok());

    gated.open();
    slow_send.await.unwrap().unwrap();
    let mut joined = late_join.await.unwrap().unwrap();

    // The late joiner sees the slow message once, in history, not again live.
    let contents: Vec<&str> = joined.history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec![SLOW]);
    assert!(matches!(joined.receiver.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(rooms.active_rooms().await, 2);
}

#[tokio::test]
async fn test_room_survives_prune_while_join_waits() {
    let memory = InMemoryStore::new();
    seed_communities(&memory).await.unwrap();
    let gated = Arc::new(GatedStore {
        inner: memory,
        entered: Notify::new(),
        gate: Semaphore::new(0),
    });
    let store: Arc<dyn Store> = gated.clone();

    let client = user(&gated, "Ana").await;
    let provider = user(&gated, "Beto").await;
    let community = gated.list_communities().await.unwrap()[0].id;
    let service = gated
        .insert_service(&NewService {
            id: Uuid::new_v4(),
            title: "Corte de pelo".to_string(),
            description: "A domicilio".to_string(),
            category: "Belleza".to_string(),
            trueqq_price: 100,
            provider_id: provider.id,
            provider_name: provider.name.clone(),
            community_id: community,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    let tx = gated.settle_service_request(service.id, client.id).await.unwrap().transaction;

    let rooms = Arc::new(RoomManager::new(store.clone(), Notifier::spawn(store, 64)));
    let first = rooms.join(tx.id, client.id, Uuid::new_v4()).await.unwrap();

    let slow_send = {
        let rooms = rooms.clone();
        let member = first.member.clone();
        let client = client.clone();
        tokio::spawn(async move { rooms.send(&member, &client, SLOW).await })
    };
    gated.entered.notified().await;

    let late_join = {
        let rooms = rooms.clone();
        let (room_id, provider_id) = (tx.id, provider.id);
        tokio::spawn(async move { rooms.join(room_id, provider_id, Uuid::new_v4()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The only established member leaves while the provider's join waits.
    drop(first.receiver);
    rooms.leave(first.member).await;
    assert_eq!(rooms.active_rooms().await, 1);

    gated.open();
    slow_send.await.unwrap().unwrap();
    let joined = late_join.await.unwrap().unwrap();

    let follow_up = rooms.send(&joined.member, &provider, "sigo aquí").await.unwrap();
    let mut receiver = joined.receiver;
    match receiver.recv().await.unwrap().event {
        trueqq_core::chat::ServerEvent::NewMessage(message) => assert_eq!(message.id, follow_up.id),
        other => panic!("unexpected event {:?}", other),
    }
}
