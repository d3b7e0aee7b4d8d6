use async_trait::async_trait;
use uuid::Uuid;

use super::rows::{UserRow, USER_COLUMNS};
use super::{is_unique_violation, PostgresStore};
use crate::domain::{NewUser, RuleViolation, User};
use crate::ports::{RepositoryError, RepositoryResult, UserRepository};

#[async_trait]
impl UserRepository for PostgresStore {
    async fn insert_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, account_type, trueqq_balance, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.account_type.as_str())
        .bind(user.trueqq_balance)
        .bind(user.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Rule(RuleViolation::EmailTaken)
            } else {
                RepositoryError::from(e)
            }
        })?;

        row.into_domain()
    }

    async fn find_user(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(UserRow::into_domain).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        row.map(UserRow::into_domain).transpose()
    }
}
