use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use satchel_types::api::Claims;
use satchel_types::events::{GatewayCommand, GatewayEvent, Update, UpdateKind};
use satchel_types::models::{ChatId, UserId};

use crate::dispatcher::Dispatcher;
use crate::{UpdateHandler, deliver_reply};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

struct Identity {
    chat_id: ChatId,
    user_id: UserId,
    first_name: String,
}

/// Handle a single WebSocket connection: Identify handshake, then relay
/// updates to `handler` and chat events back to the client.
///
/// The user and chat come only from the verified token, never from
/// anything else the client sends.
pub async fn handle_connection<H: UpdateHandler>(
    socket: WebSocket,
    dispatcher: Dispatcher,
    handler: Arc<H>,
    jwt_secret: Arc<str>,
) {
    let (mut sender, mut receiver) = socket.split();

    let identity = match wait_for_identify(&mut receiver, &jwt_secret).await {
        Some(identity) => identity,
        None => {
            warn!("WebSocket client failed to identify, closing");
            return;
        }
    };

    info!(
        "user {} attached to chat {}",
        identity.user_id, identity.chat_id
    );

    let ready = GatewayEvent::Ready {
        chat_id: identity.chat_id,
    };
    if !send_event(&mut sender, &ready).await {
        return;
    }

    run_connection_loop(sender, receiver, dispatcher, handler, identity).await;
}

async fn run_connection_loop<H: UpdateHandler>(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    dispatcher: Dispatcher,
    handler: Arc<H>,
    identity: Identity,
) {
    let chat_id = identity.chat_id;
    let (conn_id, mut chat_rx) = dispatcher.register_chat_channel(chat_id).await;

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward chat events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = chat_rx.recv() => {
                    let Some(event) = result else { break };
                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Default::default())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read updates from client; one at a time so replies keep their order
    let recv_dispatcher = dispatcher.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => {
                        let Some(update) = into_update(&identity, cmd) else {
                            continue;
                        };
                        debug!("chat {} update: {:?}", update.chat_id, update.kind);
                        if let Some(reply) = handler.handle(update.clone()).await {
                            deliver_reply(&recv_dispatcher, &update, reply).await;
                        }
                    }
                    Err(e) => {
                        warn!(
                            "chat {} bad command: {} -- raw: {}",
                            identity.chat_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.unregister_chat_channel(chat_id, conn_id).await;
    info!("chat {} detached from gateway", chat_id);
}

fn into_update(identity: &Identity, cmd: GatewayCommand) -> Option<Update> {
    let kind = match cmd {
        GatewayCommand::Identify { .. } => return None, // Already handled
        GatewayCommand::Command { name } => {
            UpdateKind::Command(name.trim_start_matches('/').to_string())
        }
        GatewayCommand::Callback { message_id, data } => UpdateKind::Callback { message_id, data },
        GatewayCommand::Text { text } => UpdateKind::Text(text),
    };
    Some(Update {
        chat_id: identity.chat_id,
        user_id: identity.user_id,
        first_name: identity.first_name.clone(),
        kind,
    })
}

async fn wait_for_identify(
    receiver: &mut SplitStream<WebSocket>,
    jwt_secret: &str,
) -> Option<Identity> {
    let identify = async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(GatewayCommand::Identify { token }) =
                    serde_json::from_str::<GatewayCommand>(&text)
                {
                    return verify_token(&token, jwt_secret);
                }
            }
        }
        None
    };

    tokio::time::timeout(IDENTIFY_TIMEOUT, identify)
        .await
        .ok()
        .flatten()
}

fn verify_token(token: &str, jwt_secret: &str) -> Option<Identity> {
    use jsonwebtoken::{DecodingKey, Validation, decode};

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => Some(Identity {
            chat_id: data.claims.chat_id,
            user_id: data.claims.sub,
            first_name: data.claims.first_name,
        }),
        Err(e) => {
            warn!("rejected Identify token: {}", e);
            None
        }
    }
}

async fn send_event(sender: &mut SplitSink<WebSocket, Message>, event: &GatewayEvent) -> bool {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            warn!("failed to encode gateway event: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(text.into())).await.is_ok()
}
