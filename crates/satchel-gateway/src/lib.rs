pub mod connection;
pub mod dispatcher;

use async_trait::async_trait;

use satchel_types::api::Reply;
use satchel_types::events::{Update, UpdateKind};

use crate::dispatcher::Dispatcher;

/// Whatever answers updates coming off the gateway.
#[async_trait]
pub trait UpdateHandler: Send + Sync + 'static {
    /// Handle one update. `None` means nothing to say.
    async fn handle(&self, update: Update) -> Option<Reply>;
}

/// Deliver a handler's reply the way the update calls for: button presses
/// rewrite the pressed message, everything else posts a new one.
pub async fn deliver_reply(dispatcher: &Dispatcher, update: &Update, reply: Reply) {
    match &update.kind {
        UpdateKind::Callback { message_id, .. } => {
            dispatcher.edit(update.chat_id, *message_id, reply).await;
        }
        UpdateKind::Command(_) | UpdateKind::Text(_) => {
            dispatcher.post(update.chat_id, reply).await;
        }
    }
}
