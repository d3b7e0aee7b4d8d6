pub mod auth;
pub mod communities;
pub mod messages;
pub mod notifications;
pub mod reviews;
pub mod services;
pub mod transactions;
pub mod ws;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request, State},
    http::{request::Parts, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `{success, count, data}`.
pub fn list_response<T: Serialize>(items: &[T]) -> Json<Value> {
    Json(json!({
        "success": true,
        "count": items.len(),
        "data": items,
    }))
}

/// `{success, data}`.
pub fn data_response<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}

/// `{success, message, data}`.
pub fn mutation_response<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (
        status,
        Json(json!({
            "success": true,
            "message": message,
            "data": data,
        })),
    )
        .into_response()
}

/// `{success, message}`.
pub fn message_response(message: &str) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": message,
    }))
}

/// JSON body extractor whose rejection uses the error envelope.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected request body");
                Err(AppError::Validation(
                    "Cuerpo de la petición inválido".to_string(),
                ))
            }
        }
    }
}

/// Path extractor whose rejection uses the error envelope.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected path parameter");
                Err(AppError::Validation("Identificador inválido".to_string()))
            }
        }
    }
}

pub async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "🚀 Bienvenido a Trueqq API",
        "version": VERSION,
        "status": "online",
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub store: String,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (status_code, status, store) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "connected"),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected")
        }
    };

    (
        status_code,
        Json(HealthStatus {
            status: status.to_string(),
            version: VERSION.to_string(),
            store: store.to_string(),
        }),
    )
}

pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "❌ Ruta no encontrada",
            "error": "not_found",
            "path": uri.path(),
        })),
    )
}
