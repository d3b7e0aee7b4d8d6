//! Registration, login and bearer-token handling.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{AccountType, CommunitySummary, NewUser, ServiceSummary, User};
use crate::error::{AppError, AppResult};
use crate::ports::Store;
use crate::validation::{
    normalize_email, validate_email, validate_max_len, validate_password, validate_required,
    NAME_MAX_LEN,
};

pub const INVALID_CREDENTIALS: &str = "Credenciales inválidas";
pub const MISSING_TOKEN: &str = "No autorizado, no hay token";
pub const INVALID_TOKEN: &str = "No autorizado, token inválido";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

/// HS256 signing and verification keys.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::days(ttl_days),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        self.issue_at(user_id, now, now + self.ttl)
    }

    fn issue_at(&self, user_id: Uuid, issued: DateTime<Utc>, expires: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            sub: user_id,
            iat: issued.timestamp(),
            exp: expires.timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token encoding failed: {}", e)))
    }

    /// Returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> AppResult<Uuid> {
        let validation = Validation::new(Algorithm::HS256);
        match jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("expired token presented"),
                    _ => tracing::debug!(error = %e, "invalid token presented"),
                }
                Err(AppError::Unauthorized(INVALID_TOKEN.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub account_type: Option<String>,
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub account_type: AccountType,
    pub trueqq_balance: i64,
    pub token: String,
}

impl AuthSession {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            account_type: user.account_type,
            trueqq_balance: user.trueqq_balance,
            token,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub account_type: AccountType,
    pub trueqq_balance: i64,
    pub communities: Vec<CommunitySummary>,
    pub services_offered: Vec<ServiceSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    keys: Arc<TokenKeys>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, keys: Arc<TokenKeys>) -> Self {
        Self { store, keys }
    }

    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthSession> {
        validate_required("name", &input.name)?;
        validate_required("email", &input.email)?;
        validate_required("password", &input.password)?;

        let name = input.name.trim().to_string();
        let email = normalize_email(&input.email);
        validate_max_len("name", &name, NAME_MAX_LEN)?;
        validate_email(&email)?;
        validate_password(&input.password)?;

        let account_type = match input.account_type.as_deref().map(str::trim) {
            None | Some("") => AccountType::default(),
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::Validation("Tipo de cuenta inválido".to_string()))?,
        };

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(crate::domain::RuleViolation::EmailTaken.into());
        }

        let password_hash = hash_password(input.password).await?;
        let user = self
            .store
            .insert_user(&NewUser::new(name, email, password_hash, account_type))
            .await?;

        tracing::info!(user_id = %user.id, account_type = %user.account_type, "user registered");

        let token = self.keys.issue(user.id)?;
        Ok(AuthSession::new(user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Por favor ingresa email y contraseña".to_string(),
            ));
        }

        let user = self
            .store
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            tracing::info!(user_id = %user.id, "login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.keys.issue(user.id)?;
        Ok(AuthSession::new(user, token))
    }

    /// Resolves a bearer token to a stored user.
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let user_id = self.keys.verify(token)?;
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<Profile> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;
        let communities = self.store.communities_of_user(user_id).await?;
        let services = self.store.services_of_provider(user_id).await?;

        Ok(Profile {
            id: user.id,
            name: user.name,
            email: user.email,
            account_type: user.account_type,
            trueqq_balance: user.trueqq_balance,
            communities: communities.iter().map(CommunitySummary::from).collect(),
            services_offered: services.iter().map(ServiceSummary::from).collect(),
            created_at: user.created_at,
        })
    }
}

async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
    .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)?;
        Ok::<bool, argon2::password_hash::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))?
    .map_err(|e| AppError::Internal(format!("stored password hash is invalid: {}", e)))
}
