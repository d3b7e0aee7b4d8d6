use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::time::Duration;

use crate::chat::{ChatSession, ServerEvent};
use crate::domain::User;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::bearer_token;
use crate::services::auth::MISSING_TOKEN;
use crate::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Upgrades to the chat socket. The token comes from `?token=` or the
/// `Authorization` header and fixes the connection's identity.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> AppResult<Response> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(&headers).map(str::to_string))
        .ok_or_else(|| AppError::Unauthorized(MISSING_TOKEN.to_string()))?;

    let user = match state.services.auth.authenticate(&token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "rejected chat socket");
            return Err(e);
        }
    };

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, user))
        .into_response())
}

async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize chat event");
            return true;
        }
    };
    sender.send(Message::Text(json)).await.is_ok()
}

async fn handle_socket(socket: WebSocket, state: AppState, user: User) {
    let (mut sender, mut receiver) = socket.split();
    let mut session = ChatSession::new(state.rooms.clone(), user);
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);

    tracing::info!(
        user_id = %session.user().id,
        connection = %session.connection(),
        "chat socket opened"
    );

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    tracing::debug!(connection = %session.connection(), "client gone during heartbeat");
                    break;
                }
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let mut alive = true;
                        for reply in session.handle_text(&text).await {
                            if !send_event(&mut sender, &reply).await {
                                alive = false;
                                break;
                            }
                        }
                        if !alive {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(connection = %session.connection(), error = %e, "chat socket error");
                        break;
                    }
                }
            }
            Some(event) = session.next_room_event(), if session.has_rooms() => {
                if !send_event(&mut sender, &event).await {
                    break;
                }
            }
        }
    }

    tracing::info!(
        user_id = %session.user().id,
        connection = %session.connection(),
        "chat socket closed"
    );
    session.close().await;
}
