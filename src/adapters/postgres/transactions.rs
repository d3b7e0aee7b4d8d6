use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::rows::{
    collect_rows, ServiceRow, TransactionRow, UserRow, SERVICE_COLUMNS, TRANSACTION_COLUMNS,
    USER_COLUMNS,
};
use super::PostgresStore;
use crate::domain::{
    check_service_request, NewTransaction, RuleViolation, Settlement, Transaction,
    TransactionDirection, TransactionTotals, User,
};
use crate::ports::{RepositoryError, RepositoryResult, TransactionRepository};

fn not_found(entity: &str, id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("{} {}", entity, id))
}

#[async_trait]
impl TransactionRepository for PostgresStore {
    async fn settle_service_request(&self, service_id: Uuid, client_id: Uuid) -> RepositoryResult<Settlement> {
        let mut db = self.pool().begin().await?;

        // Lock order: the service row, then both users by ascending id.
        let service = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1 FOR UPDATE"
        ))
        .bind(service_id)
        .fetch_optional(&mut *db)
        .await?
        .map(ServiceRow::into_domain)
        .ok_or_else(|| not_found("service", service_id))?;

        let users = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(vec![client_id, service.provider_id])
        .fetch_all(&mut *db)
        .await?;
        let users: Vec<User> = collect_rows(users, UserRow::into_domain)?;

        let client = users
            .iter()
            .find(|u| u.id == client_id)
            .ok_or_else(|| not_found("user", client_id))?;

        check_service_request(&service, client)?;

        let provider = users
            .iter()
            .find(|u| u.id == service.provider_id)
            .ok_or_else(|| not_found("user", service.provider_id))?;

        let new_tx = NewTransaction::settled(&service, client, provider);
        let price = new_tx.trueqq_amount;

        let client_balance: i64 = sqlx::query_scalar(
            "UPDATE users SET trueqq_balance = trueqq_balance - $2 WHERE id = $1 RETURNING trueqq_balance",
        )
        .bind(client.id)
        .bind(price)
        .fetch_one(&mut *db)
        .await?;

        let provider_balance: i64 = sqlx::query_scalar(
            "UPDATE users SET trueqq_balance = trueqq_balance + $2 WHERE id = $1 RETURNING trueqq_balance",
        )
        .bind(provider.id)
        .bind(price)
        .fetch_one(&mut *db)
        .await?;

        sqlx::query("UPDATE services SET times_requested = times_requested + 1 WHERE id = $1")
            .bind(service.id)
            .execute(&mut *db)
            .await?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            INSERT INTO transactions (
                id, service_id, service_title, provider_id, provider_name,
                client_id, client_name, trueqq_amount, status, chat_active,
                completed_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(new_tx.id)
        .bind(new_tx.service_id)
        .bind(&new_tx.service_title)
        .bind(new_tx.provider_id)
        .bind(&new_tx.provider_name)
        .bind(new_tx.client_id)
        .bind(&new_tx.client_name)
        .bind(new_tx.trueqq_amount)
        .bind(new_tx.status.as_str())
        .bind(new_tx.chat_active)
        .bind(new_tx.completed_at)
        .bind(new_tx.created_at)
        .fetch_one(&mut *db)
        .await?;

        db.commit().await?;

        Ok(Settlement {
            transaction: row.into_domain()?,
            client_balance,
            provider_balance,
        })
    }

    async fn find_transaction(&self, id: Uuid) -> RepositoryResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    async fn list_transactions(&self, user_id: Uuid, direction: TransactionDirection) -> RepositoryResult<Vec<Transaction>> {
        let condition = match direction {
            TransactionDirection::Sent => "client_id = $1",
            TransactionDirection::Received => "provider_id = $1",
            TransactionDirection::All => "(client_id = $1 OR provider_id = $1)",
        };
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE {condition} ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        collect_rows(rows, TransactionRow::into_domain)
    }

    async fn complete_transaction(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"
            UPDATE transactions SET status = 'completed', completed_at = $2
            WHERE id = $1 AND status <> 'completed'
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => row.into_domain(),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM transactions WHERE id = $1)")
                        .bind(id)
                        .fetch_one(self.pool())
                        .await?;
                if exists {
                    Err(RuleViolation::AlreadyCompleted.into())
                } else {
                    Err(not_found("transaction", id))
                }
            }
        }
    }

    async fn transaction_totals(&self, user_id: Uuid) -> RepositoryResult<TransactionTotals> {
        let (total_sent, total_received, sent_count, received_count): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COALESCE(SUM(trueqq_amount) FILTER (WHERE client_id = $1), 0)::BIGINT,
                    COALESCE(SUM(trueqq_amount) FILTER (WHERE provider_id = $1), 0)::BIGINT,
                    COUNT(*) FILTER (WHERE client_id = $1),
                    COUNT(*) FILTER (WHERE provider_id = $1)
                FROM transactions
                WHERE status = 'completed' AND (client_id = $1 OR provider_id = $1)
                "#,
            )
            .bind(user_id)
            .fetch_one(self.pool())
            .await?;

        Ok(TransactionTotals {
            total_sent,
            total_received,
            sent_count,
            received_count,
        })
    }
}
