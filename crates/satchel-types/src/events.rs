use serde::{Deserialize, Serialize};

use crate::api::Keyboard;
use crate::models::{ChatId, MessageId, UserId};

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms the chat is attached
    Ready { chat_id: ChatId },

    /// A new bot message in the chat
    MessageCreate {
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },

    /// An existing bot message was rewritten (button responses)
    MessageEdit {
        message_id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Attach this connection to a chat; the JWT names the user and chat
    Identify { token: String },

    /// A slash command, without the leading `/`
    Command { name: String },

    /// A button press on one of the bot's messages
    Callback { message_id: MessageId, data: String },

    /// Free text typed by the user
    Text { text: String },
}

/// An inbound update after the connection has been identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub first_name: String,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    Command(String),
    Callback { message_id: MessageId, data: String },
    Text(String),
}
