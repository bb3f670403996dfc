use std::collections::HashMap;

use tokio::sync::RwLock;

use satchel_types::api::{Collection, Direction};
use satchel_types::models::{ChatId, UserId};

use crate::calculator::INITIAL_DISPLAY;

/// What the next free-text message from a user is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInput {
    Add(Collection),
    Translation(Direction),
}

/// Conversation state that lives only in memory.
#[derive(Default)]
pub struct Sessions {
    /// user_id -> what their next text message feeds
    pending: RwLock<HashMap<UserId, PendingInput>>,

    /// chat_id -> calculator display
    displays: RwLock<HashMap<ChatId, String>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever the user was in the middle of.
    pub async fn set_pending(&self, user: UserId, input: PendingInput) {
        self.pending.write().await.insert(user, input);
    }

    pub async fn pending(&self, user: UserId) -> Option<PendingInput> {
        self.pending.read().await.get(&user).copied()
    }

    pub async fn clear_pending(&self, user: UserId) {
        self.pending.write().await.remove(&user);
    }

    pub async fn display(&self, chat: ChatId) -> String {
        self.displays
            .read()
            .await
            .get(&chat)
            .cloned()
            .unwrap_or_else(|| INITIAL_DISPLAY.to_string())
    }

    pub async fn set_display(&self, chat: ChatId, display: String) {
        self.displays.write().await.insert(chat, display);
    }
}
