use async_trait::async_trait;
use uuid::Uuid;

use super::rows::{collect_rows, NotificationRow, NOTIFICATION_COLUMNS};
use super::PostgresStore;
use crate::domain::{NewNotification, Notification};
use crate::ports::{NotificationRepository, RepositoryError, RepositoryResult};

#[async_trait]
impl NotificationRepository for PostgresStore {
    async fn insert_notification(&self, notification: &NewNotification) -> RepositoryResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            INSERT INTO notifications (
                id, user_id, kind, title, message,
                related_service_id, related_transaction_id, related_review_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related_service)
        .bind(notification.related_transaction)
        .bind(notification.related_review)
        .bind(notification.created_at)
        .fetch_one(self.pool())
        .await?;

        row.into_domain()
    }

    async fn list_notifications(&self, user_id: Uuid, unread_only: bool, limit: i64) -> RepositoryResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        collect_rows(rows, NotificationRow::into_domain)
    }

    async fn count_unread(&self, user_id: Uuid) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    async fn find_notification(&self, id: Uuid) -> RepositoryResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(NotificationRow::into_domain).transpose()
    }

    async fn mark_notification_read(&self, id: Uuid) -> RepositoryResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "UPDATE notifications SET read = TRUE WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound(format!("notification {}", id)))?
            .into_domain()
    }

    async fn mark_all_read(&self, user_id: Uuid) -> RepositoryResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }
}
