use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use satchel_types::api::Reply;
use satchel_types::events::GatewayEvent;
use satchel_types::models::{ChatId, MessageId};

/// Routes outgoing bot messages to whichever connection currently owns a chat.
///
/// Cloning is cheap; all clones share the same channel table. Senders are
/// plain `mpsc` handles, so any task (including timer callbacks) can deliver
/// into a chat without touching the socket.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Per-chat send channels: chat_id -> (conn_id, sender)
    chat_channels: RwLock<HashMap<ChatId, (Uuid, mpsc::UnboundedSender<GatewayEvent>)>>,

    next_message_id: AtomicU64,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                chat_channels: RwLock::new(HashMap::new()),
                next_message_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a chat's delivery channel. Returns (conn_id, receiver).
    /// A newer registration for the same chat replaces the older one.
    pub async fn register_chat_channel(
        &self,
        chat_id: ChatId,
    ) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .chat_channels
            .write()
            .await
            .insert(chat_id, (conn_id, tx));
        (conn_id, rx)
    }

    /// Unregister a chat's channel, but only if conn_id matches.
    pub async fn unregister_chat_channel(&self, chat_id: ChatId, conn_id: Uuid) {
        let mut channels = self.inner.chat_channels.write().await;
        if let Some((stored_conn_id, _)) = channels.get(&chat_id) {
            if *stored_conn_id == conn_id {
                channels.remove(&chat_id);
            }
        }
    }

    pub async fn is_connected(&self, chat_id: ChatId) -> bool {
        self.inner.chat_channels.read().await.contains_key(&chat_id)
    }

    /// Send an event to a chat. Returns false if nobody is listening.
    pub async fn send_to_chat(&self, chat_id: ChatId, event: GatewayEvent) -> bool {
        let channels = self.inner.chat_channels.read().await;
        match channels.get(&chat_id) {
            Some((_, tx)) => tx.send(event).is_ok(),
            None => {
                debug!("chat {} has no listener, dropping event", chat_id);
                false
            }
        }
    }

    pub fn next_message_id(&self) -> MessageId {
        self.inner.next_message_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Post a new message into a chat. Returns its id if it was delivered.
    pub async fn post(&self, chat_id: ChatId, reply: Reply) -> Option<MessageId> {
        let message_id = self.next_message_id();
        let event = GatewayEvent::MessageCreate {
            message_id,
            text: reply.text,
            keyboard: reply.keyboard,
        };
        self.send_to_chat(chat_id, event).await.then_some(message_id)
    }

    /// Rewrite a message previously posted into a chat.
    pub async fn edit(&self, chat_id: ChatId, message_id: MessageId, reply: Reply) -> bool {
        let event = GatewayEvent::MessageEdit {
            message_id,
            text: reply.text,
            keyboard: reply.keyboard,
        };
        self.send_to_chat(chat_id, event).await
    }
}
