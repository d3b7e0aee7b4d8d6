pub mod auth;
pub mod catalog;
pub mod communities;
pub mod notifications;
pub mod reviews;
pub mod transactions;

pub use auth::{AuthService, TokenKeys};
pub use catalog::CatalogService;
pub use communities::CommunityService;
pub use notifications::{NotificationService, Notifier};
pub use reviews::ReviewService;
pub use transactions::TransactionService;

use std::sync::Arc;

use crate::ports::Store;

/// Every application service, wired to one store and one notifier.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub communities: CommunityService,
    pub catalog: CatalogService,
    pub transactions: TransactionService,
    pub reviews: ReviewService,
    pub notifications: NotificationService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier, keys: Arc<TokenKeys>) -> Self {
        Self {
            auth: AuthService::new(store.clone(), keys),
            communities: CommunityService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            transactions: TransactionService::new(store.clone(), notifier.clone()),
            reviews: ReviewService::new(store.clone(), notifier),
            notifications: NotificationService::new(store),
        }
    }
}
