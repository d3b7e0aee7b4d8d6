use async_trait::async_trait;
use uuid::Uuid;

use super::rows::{ReviewRow, REVIEW_COLUMNS};
use super::{is_unique_violation, PostgresStore};
use crate::domain::{NewReview, Review, RuleViolation};
use crate::ports::{RepositoryError, RepositoryResult, ReviewRepository};

#[async_trait]
impl ReviewRepository for PostgresStore {
    async fn insert_review(&self, review: &NewReview) -> RepositoryResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            INSERT INTO reviews (
                id, transaction_id, service_id, service_title, provider_id,
                client_id, client_name, rating, comment, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(review.id)
        .bind(review.transaction_id)
        .bind(review.service_id)
        .bind(&review.service_title)
        .bind(review.provider_id)
        .bind(review.client_id)
        .bind(&review.client_name)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Rule(RuleViolation::DuplicateReview)
            } else {
                RepositoryError::from(e)
            }
        })?;

        Ok(row.into_domain())
    }

    async fn review_for_transaction(&self, transaction_id: Uuid) -> RepositoryResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(ReviewRow::into_domain))
    }

    async fn reviews_for_service(&self, service_id: Uuid) -> RepositoryResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE service_id = $1 ORDER BY created_at DESC"
        ))
        .bind(service_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(ReviewRow::into_domain).collect())
    }

    async fn reviews_for_provider(&self, provider_id: Uuid) -> RepositoryResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE provider_id = $1 ORDER BY created_at DESC"
        ))
        .bind(provider_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(ReviewRow::into_domain).collect())
    }
}
