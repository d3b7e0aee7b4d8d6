use axum::{extract::State, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{list_response, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::AppState;

/// Chat history over HTTP for clients that load it before opening the socket.
pub async fn transaction_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(transaction_id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let messages = state
        .services
        .transactions
        .message_history(user.id, transaction_id)
        .await?;
    Ok(list_response(&messages))
}
