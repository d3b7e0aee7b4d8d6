use async_trait::async_trait;
use uuid::Uuid;

use super::rows::{MessageRow, MESSAGE_COLUMNS};
use super::{is_foreign_key_violation, PostgresStore};
use crate::domain::{Message, NewMessage};
use crate::ports::{MessageRepository, RepositoryError, RepositoryResult};

#[async_trait]
impl MessageRepository for PostgresStore {
    async fn insert_message(&self, message: &NewMessage) -> RepositoryResult<Message> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            INSERT INTO messages (id, transaction_id, sender_id, sender_name, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message.id)
        .bind(message.transaction_id)
        .bind(message.sender_id)
        .bind(&message.sender_name)
        .bind(&message.content)
        .bind(message.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                RepositoryError::NotFound(format!("transaction {}", message.transaction_id))
            } else {
                RepositoryError::from(e)
            }
        })?;

        Ok(row.into_domain())
    }

    async fn recent_messages(&self, transaction_id: Uuid, limit: i64) -> RepositoryResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM (
                SELECT {MESSAGE_COLUMNS} FROM messages
                WHERE transaction_id = $1
                ORDER BY seq DESC
                LIMIT $2
            ) recent
            ORDER BY seq ASC
            "#
        ))
        .bind(transaction_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(MessageRow::into_domain).collect())
    }
}
