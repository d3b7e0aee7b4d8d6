pub mod adapters;
pub mod chat;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod startup;
pub mod validation;

use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::chat::RoomManager;
use crate::config::{AllowedOrigins, Config};
use crate::ports::Store;
use crate::services::{Notifier, Services, TokenKeys};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub services: Services,
    pub rooms: Arc<RoomManager>,
    pub cors: AllowedOrigins,
}

impl AppState {
    /// Wires services and chat rooms to `store` and starts the notification
    /// worker. Must run inside a Tokio runtime.
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        let notifier = Notifier::spawn(store.clone(), config.notification_queue_capacity);
        let keys = Arc::new(TokenKeys::new(config.jwt_secret.as_bytes(), config.jwt_ttl_days));

        Self {
            services: Services::new(store.clone(), notifier.clone(), keys),
            rooms: Arc::new(RoomManager::new(store.clone(), notifier)),
            cors: config.cors_allowed_origins.clone(),
            store,
        }
    }
}

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    match origins {
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
        .route("/communities", get(handlers::communities::list_communities))
        .route("/communities/:id", get(handlers::communities::get_community))
        .route("/communities/:id/join", post(handlers::communities::join_community))
        .route(
            "/communities/:id/services",
            get(handlers::communities::community_services),
        )
        .route(
            "/services",
            get(handlers::services::list_services).post(handlers::services::create_service),
        )
        .route(
            "/services/:id",
            get(handlers::services::get_service)
                .put(handlers::services::update_service)
                .delete(handlers::services::delete_service),
        )
        .route("/transactions/request", post(handlers::transactions::request_service))
        .route(
            "/transactions/my-transactions",
            get(handlers::transactions::my_transactions),
        )
        .route("/transactions/stats/summary", get(handlers::transactions::summary))
        .route("/transactions/:id", get(handlers::transactions::get_transaction))
        .route(
            "/transactions/:id/complete",
            put(handlers::transactions::complete_transaction),
        )
        .route("/reviews", post(handlers::reviews::create_review))
        .route("/reviews/service/:id", get(handlers::reviews::service_reviews))
        .route("/reviews/provider/:id", get(handlers::reviews::provider_reviews))
        .route(
            "/reviews/transaction/:id",
            get(handlers::reviews::transaction_review),
        )
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route(
            "/notifications/mark-all-read",
            put(handlers::notifications::mark_all_read),
        )
        .route("/notifications/:id/read", put(handlers::notifications::mark_read))
        .route("/messages/:id", get(handlers::messages::transaction_messages));

    let cors = cors_layer(&state.cors);

    Router::new()
        .route("/", get(handlers::welcome))
        .route("/health", get(handlers::health))
        .route("/ws", get(handlers::ws::ws_handler))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(axum_middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .layer(cors)
        .with_state(state)
}
