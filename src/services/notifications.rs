//! Notification emitter and the read-side service.
//!
//! Producers call [`Notifier::emit`], which never blocks and never fails the
//! caller. A background worker drains the bounded queue into the store.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{NewNotification, Notification};
use crate::error::{AppError, AppResult};
use crate::ports::Store;

pub const NOTIFICATION_LIST_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<NewNotification>,
}

impl Notifier {
    /// Spawns the worker on the current runtime.
    pub fn spawn(store: Arc<dyn Store>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_notification_worker(store, rx));
        Self { tx }
    }

    pub fn emit(&self, notification: NewNotification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => warn!(
                user_id = %n.user_id,
                kind = n.kind.as_str(),
                "notification queue full, dropping notification"
            ),
            Err(TrySendError::Closed(n)) => warn!(
                user_id = %n.user_id,
                kind = n.kind.as_str(),
                "notification worker stopped, dropping notification"
            ),
        }
    }
}

pub async fn run_notification_worker(store: Arc<dyn Store>, mut rx: mpsc::Receiver<NewNotification>) {
    info!("Notification worker started");

    while let Some(notification) = rx.recv().await {
        if let Err(e) = store.insert_notification(&notification).await {
            error!(
                user_id = %notification.user_id,
                kind = notification.kind.as_str(),
                error = %e,
                "failed to store notification"
            );
        }
    }

    info!("Notification worker stopped");
}

#[derive(Debug, Clone)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn Store>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Newest first, at most 50, plus the user's total unread count.
    pub async fn list(&self, user_id: Uuid, unread_only: bool) -> AppResult<NotificationList> {
        let notifications = self
            .store
            .list_notifications(user_id, unread_only, NOTIFICATION_LIST_LIMIT)
            .await?;
        let unread_count = self.store.count_unread(user_id).await?;
        Ok(NotificationList {
            notifications,
            unread_count,
        })
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<Notification> {
        let notification = self
            .store
            .find_notification(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notificación no encontrada".to_string()))?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "No tienes permiso para modificar esta notificación".to_string(),
            ));
        }

        Ok(self.store.mark_notification_read(id).await?)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        Ok(self.store.mark_all_read(user_id).await?)
    }
}
