use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
pub const MAX_COMMENT_LEN: usize = 500;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub service_id: Uuid,
    pub service_title: String,
    pub provider_id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub service_id: Uuid,
    pub service_title: String,
    pub provider_id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl NewReview {
    pub fn into_review(self) -> Review {
        Review {
            id: self.id,
            transaction_id: self.transaction_id,
            service_id: self.service_id,
            service_title: self.service_title,
            provider_id: self.provider_id,
            client_id: self.client_id,
            client_name: self.client_name,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
        }
    }
}

/// Mean rating rounded to one decimal, or `None` for no ratings.
pub fn average_rating(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let mean = sum as f64 / ratings.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}
