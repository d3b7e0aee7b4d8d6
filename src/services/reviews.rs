use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    average_rating, NewNotification, NewReview, NotificationType, Review, RuleViolation,
    TransactionStatus, User,
};
use crate::error::{AppError, AppResult};
use crate::ports::Store;
use crate::services::notifications::Notifier;
use crate::validation::{validate_comment, validate_rating};

#[derive(Debug, Clone, Default)]
pub struct CreateReviewInput {
    pub transaction_id: Option<Uuid>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReviews {
    pub reviews: Vec<Review>,
    /// One decimal, 0 when there are no reviews.
    pub average_rating: f64,
}

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn Store>,
    notifier: Notifier,
}

impl ReviewService {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    pub async fn create(&self, client: &User, input: CreateReviewInput) -> AppResult<Review> {
        let (transaction_id, rating) = match (input.transaction_id, input.rating) {
            (Some(t), Some(r)) => (t, r),
            _ => {
                return Err(AppError::Validation(
                    "El ID de transacción y la calificación son requeridos".to_string(),
                ))
            }
        };
        validate_rating(rating)?;
        let comment = input.comment.unwrap_or_default().trim().to_string();
        validate_comment(&comment)?;

        let tx = self
            .store
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transacción no encontrada".to_string()))?;

        if tx.client_id != client.id {
            return Err(AppError::Forbidden(
                "Solo el cliente puede calificar este servicio".to_string(),
            ));
        }
        if tx.status != TransactionStatus::Completed {
            return Err(RuleViolation::TransactionNotCompleted.into());
        }
        if self.store.review_for_transaction(tx.id).await?.is_some() {
            return Err(RuleViolation::DuplicateReview.into());
        }

        // The unique constraint still catches a racing duplicate.
        let review = self
            .store
            .insert_review(&NewReview {
                id: Uuid::new_v4(),
                transaction_id: tx.id,
                service_id: tx.service_id,
                service_title: tx.service_title.clone(),
                provider_id: tx.provider_id,
                client_id: client.id,
                client_name: client.name.clone(),
                rating,
                comment,
                created_at: chrono::Utc::now(),
            })
            .await?;

        tracing::info!(review_id = %review.id, service_id = %review.service_id, rating, "review created");

        self.refresh_service_rating(review.service_id).await;

        self.notifier.emit(
            NewNotification::new(
                review.provider_id,
                NotificationType::ReviewReceived,
                "Nueva calificación",
                format!(
                    "{} calificó \"{}\" con {} estrellas",
                    review.client_name, review.service_title, review.rating
                ),
            )
            .with_service(review.service_id)
            .with_transaction(review.transaction_id)
            .with_review(review.id),
        );

        Ok(review)
    }

    /// Recomputes the listing's mean rating. The review is already stored,
    /// so failures here are logged and dropped.
    async fn refresh_service_rating(&self, service_id: Uuid) {
        let result = async {
            let reviews = self.store.reviews_for_service(service_id).await?;
            let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
            if let Some(mean) = average_rating(&ratings) {
                self.store
                    .set_service_rating(service_id, mean, ratings.len() as i64)
                    .await?;
            }
            Ok::<(), crate::ports::RepositoryError>(())
        }
        .await;

        if let Err(e) = result {
            tracing::error!(service_id = %service_id, error = %e, "failed to update service rating");
        }
    }

    pub async fn for_service(&self, service_id: Uuid) -> AppResult<Vec<Review>> {
        Ok(self.store.reviews_for_service(service_id).await?)
    }

    pub async fn for_provider(&self, provider_id: Uuid) -> AppResult<ProviderReviews> {
        let reviews = self.store.reviews_for_provider(provider_id).await?;
        let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
        Ok(ProviderReviews {
            average_rating: average_rating(&ratings).unwrap_or(0.0),
            reviews,
        })
    }

    pub async fn for_transaction(&self, transaction_id: Uuid) -> AppResult<Review> {
        self.store
            .review_for_transaction(transaction_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No se encontró calificación para esta transacción".to_string())
            })
    }
}
