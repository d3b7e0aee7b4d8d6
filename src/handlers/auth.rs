use axum::{extract::State, http::StatusCode, response::Response, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppResult;
use crate::handlers::{data_response, mutation_response, ApiJson};
use crate::middleware::auth::AuthUser;
use crate::services::auth::RegisterInput;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub account_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> AppResult<Response> {
    let session = state
        .services
        .auth
        .register(RegisterInput {
            name: body.name,
            email: body.email,
            password: body.password,
            account_type: body.account_type,
        })
        .await?;

    Ok(mutation_response(
        StatusCode::CREATED,
        "Usuario registrado exitosamente",
        session,
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<Response> {
    let session = state.services.auth.login(&body.email, &body.password).await?;
    Ok(mutation_response(StatusCode::OK, "Inicio de sesión exitoso", session))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Value>> {
    let profile = state.services.auth.profile(user.id).await?;
    Ok(data_response(profile))
}
