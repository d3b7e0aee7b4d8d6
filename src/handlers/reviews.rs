use axum::{extract::State, http::StatusCode, response::Response, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{data_response, list_response, mutation_response, ApiJson, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::services::reviews::CreateReviewInput;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub transaction_id: Option<Uuid>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<CreateReviewRequest>,
) -> AppResult<Response> {
    let review = state
        .services
        .reviews
        .create(
            &user,
            CreateReviewInput {
                transaction_id: body.transaction_id,
                rating: body.rating,
                comment: body.comment,
            },
        )
        .await?;

    Ok(mutation_response(
        StatusCode::CREATED,
        "Calificación enviada exitosamente",
        review,
    ))
}

pub async fn service_reviews(
    State(state): State<AppState>,
    ApiPath(service_id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let reviews = state.services.reviews.for_service(service_id).await?;
    Ok(list_response(&reviews))
}

pub async fn provider_reviews(
    State(state): State<AppState>,
    ApiPath(provider_id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let result = state.services.reviews.for_provider(provider_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": result.reviews.len(),
        "averageRating": result.average_rating,
        "data": result.reviews,
    })))
}

pub async fn transaction_review(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiPath(transaction_id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let review = state.services.reviews.for_transaction(transaction_id).await?;
    Ok(data_response(review))
}
