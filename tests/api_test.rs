use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use trueqq_core::adapters::InMemoryStore;
use trueqq_core::config::{AllowedOrigins, Config, LogFormat};
use trueqq_core::db::seed_communities;
use trueqq_core::{create_app, AppState};

fn test_config() -> Config {
    Config {
        server_port: 0,
        database_url: None,
        database_max_connections: 1,
        jwt_secret: "test-secret-for-trueqq".to_string(),
        jwt_ttl_days: 1,
        cors_allowed_origins: AllowedOrigins::Any,
        notification_queue_capacity: 64,
        log_format: LogFormat::Pretty,
    }
}

async fn app() -> Router {
    let store = InMemoryStore::new();
    seed_communities(&store).await.unwrap();
    create_app(AppState::new(Arc::new(store), &test_config()))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, name: &str, account_type: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": name,
            "email": format!("{}@trueqq.test", name.to_lowercase()),
            "password": "secreto123",
            "accountType": account_type,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["data"]["token"].as_str().unwrap().to_string(),
        body["data"]["id"].as_str().unwrap().to_string(),
    )
}

async fn first_community(app: &Router) -> String {
    let (_, body) = call(app, Method::GET, "/api/communities", None, None).await;
    body["data"][0]["id"].as_str().unwrap().to_string()
}

async fn create_listing(app: &Router, token: &str, price: i64) -> String {
    let community = first_community(app).await;
    let (status, body) = call(
        app,
        Method::POST,
        "/api/services",
        Some(token),
        Some(json!({
            "title": "Clases de cocina",
            "description": "Pastas caseras",
            "category": "Cocina",
            "trueqqPrice": price,
            "community": community,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["message"], "Servicio creado exitosamente");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_welcome_health_and_fallback() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = call(&app, Method::GET, "/api/nada", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_request_id_header_is_set() {
    let app = app().await;
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let app = app().await;
    let (token, id) = register(&app, "Ana", "freemium").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ANA@trueqq.test", "password": "secreto123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Inicio de sesión exitoso");
    assert_eq!(body["data"]["id"], id.as_str());

    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["trueqqBalance"], 500);
    assert_eq!(body["data"]["accountType"], "freemium");
    assert!(body["data"].get("passwordHash").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ana@trueqq.test", "password": "incorrecta" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Credenciales inválidas");
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = app().await;
    register(&app, "Ana", "free").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Otra Ana",
            "email": "ana@trueqq.test",
            "password": "secreto123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email_taken");
}

#[tokio::test]
async fn test_auth_errors_use_the_envelope() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No autorizado, no hay token");
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = call(&app, Method::GET, "/api/auth/me", Some("basura"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No autorizado, token inválido");
}

#[tokio::test]
async fn test_bad_input_gets_validation_errors() {
    let app = app().await;
    let (token, _) = register(&app, "Ana", "freemium").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/services")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::GET, "/api/services/no-es-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Identificador inválido");

    let (status, body) = call(&app, Method::GET, "/api/services?minPrice=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/transactions/request",
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "El ID del servicio es requerido");
}

#[tokio::test]
async fn test_communities_join_flow() {
    let app = app().await;
    let (token, _) = register(&app, "Ana", "free").await;

    let (status, body) = call(&app, Method::GET, "/api/communities", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 8);

    let community = first_community(&app).await;
    let uri = format!("/api/communities/{}/join", community);

    let (status, body) = call(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["membersCount"], 1);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Te uniste exitosamente a "));

    let (status, body) = call(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "already_member");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/communities/{}", community),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_marketplace_flow_over_http() {
    let app = app().await;
    let (client_token, _) = register(&app, "Ana", "freemium").await;
    let (provider_token, provider_id) = register(&app, "Beto", "freemium").await;
    let service_id = create_listing(&app, &provider_token, 200).await;

    let (status, body) = call(&app, Method::GET, "/api/services?search=COCINA", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/transactions/request",
        Some(&provider_token),
        Some(json!({ "serviceId": service_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "self_transaction");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/transactions/request",
        Some(&client_token),
        Some(json!({ "serviceId": service_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["newBalance"], 300);
    assert_eq!(body["data"]["trueqqsTransferred"], 200);
    assert_eq!(body["data"]["transaction"]["status"], "completed");
    let tx_id = body["data"]["transaction"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/transactions/my-transactions?type=sent",
        Some(&client_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/transactions/stats/summary",
        Some(&provider_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalReceived"], 200);
    assert_eq!(body["data"]["currentBalance"], 700);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/transactions/{}/complete", tx_id),
        Some(&provider_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "already_completed");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&client_token),
        Some(json!({ "transactionId": tx_id, "rating": 4, "comment": "Rico" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["message"], "Calificación enviada exitosamente");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/reviews/provider/{}", provider_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["averageRating"], 4.0);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/messages/{}", tx_id),
        Some(&client_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_only_the_owner_edits_a_listing() {
    let app = app().await;
    let (owner, _) = register(&app, "Beto", "freemium").await;
    let (other, _) = register(&app, "Ana", "freemium").await;
    let service_id = create_listing(&app, &owner, 120).await;
    let uri = format!("/api/services/{}", service_id);

    let (status, _) = call(
        &app,
        Method::PUT,
        &uri,
        Some(&other),
        Some(json!({ "trueqqPrice": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        Method::PUT,
        &uri,
        Some(&owner),
        Some(json!({ "trueqqPrice": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["trueqqPrice"], 150);

    let (status, body) = call(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Servicio eliminado exitosamente");

    let (_, body) = call(&app, Method::GET, "/api/services", None, None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_notifications_after_a_request() {
    let app = app().await;
    let (client_token, _) = register(&app, "Ana", "freemium").await;
    let (provider_token, _) = register(&app, "Beto", "freemium").await;
    let service_id = create_listing(&app, &provider_token, 50).await;

    call(
        &app,
        Method::POST,
        "/api/transactions/request",
        Some(&client_token),
        Some(json!({ "serviceId": service_id })),
    )
    .await;

    let mut listed = Value::Null;
    for _ in 0..100 {
        let (_, body) = call(&app, Method::GET, "/api/notifications", Some(&provider_token), None).await;
        if body["count"] == 1 {
            listed = body;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(listed["unreadCount"], 1);
    assert_eq!(listed["data"][0]["type"], "service_request");
    let id = listed["data"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/notifications/{}/read", id),
        Some(&client_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/notifications/mark-all-read",
        Some(&provider_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Todas las notificaciones marcadas como leídas");

    let (_, body) = call(
        &app,
        Method::GET,
        "/api/notifications?unreadOnly=true",
        Some(&provider_token),
        None,
    )
    .await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["unreadCount"], 0);
}
