use axum::{extract::State, http::StatusCode, response::Response, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{data_response, list_response, mutation_response, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::AppState;

pub async fn list_communities(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let communities = state.services.communities.list().await?;
    Ok(list_response(&communities))
}

pub async fn get_community(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let detail = state.services.communities.get(id).await?;
    Ok(data_response(detail))
}

pub async fn join_community(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Response> {
    let outcome = state.services.communities.join(id, user.id).await?;
    let message = format!("Te uniste exitosamente a {}", outcome.community_name);
    Ok(mutation_response(StatusCode::OK, &message, outcome))
}

pub async fn community_services(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let services = state.services.communities.services(id).await?;
    Ok(list_response(&services))
}
