use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::TransactionDirection;
use crate::error::{AppError, AppResult};
use crate::handlers::{data_response, list_response, mutation_response, ApiJson, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestServiceBody {
    pub service_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn request_service(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<RequestServiceBody>,
) -> AppResult<Response> {
    let service_id = body
        .service_id
        .ok_or_else(|| AppError::Validation("El ID del servicio es requerido".to_string()))?;

    let outcome = state
        .services
        .transactions
        .request_service(&user, service_id)
        .await?;

    Ok(mutation_response(
        StatusCode::CREATED,
        "¡Servicio solicitado exitosamente! Se han descontado los Trueqqs de tu billetera.",
        outcome,
    ))
}

pub async fn my_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<TransactionQuery>,
) -> AppResult<Json<Value>> {
    let direction = TransactionDirection::from_query(query.kind.as_deref());
    let transactions = state.services.transactions.list(user.id, direction).await?;
    Ok(list_response(&transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let tx = state.services.transactions.get(user.id, id).await?;
    Ok(data_response(tx))
}

pub async fn complete_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Response> {
    let tx = state.services.transactions.complete(user.id, id).await?;
    Ok(mutation_response(
        StatusCode::OK,
        "Transacción completada exitosamente",
        tx,
    ))
}

pub async fn summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Value>> {
    let summary = state.services.transactions.summary(user.id).await?;
    Ok(data_response(summary))
}
