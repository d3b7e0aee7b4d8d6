use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{data_response, message_response, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    /// `?unreadOnly=true` limits the list to unread notifications.
    pub unread_only: Option<String>,
}

impl NotificationQuery {
    fn unread_only(&self) -> bool {
        self.unread_only.as_deref() == Some("true")
    }
}

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Value>> {
    let list = state
        .services
        .notifications
        .list(user.id, query.unread_only())
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": list.notifications.len(),
        "unreadCount": list.unread_count,
        "data": list.notifications,
    })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let notification = state.services.notifications.mark_read(user.id, id).await?;
    Ok(data_response(notification))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Value>> {
    let updated = state.services.notifications.mark_all_read(user.id).await?;
    tracing::debug!(user_id = %user.id, updated, "notifications marked read");
    Ok(message_response("Todas las notificaciones marcadas como leídas"))
}
