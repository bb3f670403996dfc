pub mod calculator;
pub mod calendar;
pub mod cards;
pub mod collections;
pub mod error;
pub mod links;
pub mod menu;
pub mod parse;
pub mod session;
pub mod timer;
pub mod translate;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use satchel_gateway::UpdateHandler;
use satchel_gateway::dispatcher::Dispatcher;
use satchel_store::Store;
use satchel_types::api::{CallbackData, Collection, CollectionAction, Reply};
use satchel_types::events::{Update, UpdateKind};
use satchel_types::models::UserId;

use crate::calendar::Calendar;
use crate::cards::Cards;
use crate::error::Result;
use crate::links::Links;
use crate::session::{PendingInput, Sessions};
use crate::timer::TimerRegistry;
use crate::translate::Translator;

/// The assistant: routes each update to the feature it belongs to.
pub struct Bot {
    store: Arc<Store>,
    sessions: Sessions,
    timers: TimerRegistry,
    translator: Arc<dyn Translator>,
}

impl Bot {
    /// `timer_unit` is the real length of one timer minute.
    pub fn new(
        store: Arc<Store>,
        dispatcher: Dispatcher,
        translator: Arc<dyn Translator>,
        timer_unit: Duration,
    ) -> Self {
        Self {
            store,
            sessions: Sessions::new(),
            timers: TimerRegistry::new(dispatcher, timer_unit),
            translator,
        }
    }

    /// Handle one update. `Ok(None)` means the update needs no answer.
    pub async fn process(&self, update: &Update) -> Result<Option<Reply>> {
        match &update.kind {
            UpdateKind::Command(name) => Ok(Some(self.on_command(update, name).await)),
            UpdateKind::Callback { data, .. } => self.on_callback(update, data).await,
            UpdateKind::Text(text) => self.on_text(update.user_id, text).await,
        }
    }

    async fn on_command(&self, update: &Update, name: &str) -> Reply {
        match name {
            "start" => menu::start(&update.first_name),
            "help" => menu::help(),
            "calculator" => {
                self.sessions
                    .set_display(update.chat_id, calculator::INITIAL_DISPLAY.to_string())
                    .await;
                calculator::render(calculator::INITIAL_DISPLAY)
            }
            "cards" => collections::menu::<Cards>(),
            "calendar" => collections::menu::<Calendar>(),
            "links" => collections::menu::<Links>(),
            "translate" => translate::menu(),
            "timer" => timer::menu(),
            other => {
                debug!("unknown command /{}", other);
                menu::help()
            }
        }
    }

    async fn on_callback(&self, update: &Update, data: &str) -> Result<Option<Reply>> {
        let data: CallbackData = match data.parse() {
            Ok(data) => data,
            Err(e) => {
                warn!("chat {}: {}", update.chat_id, e);
                return Ok(None);
            }
        };

        let reply = match data {
            CallbackData::Calc(key) => {
                let display = self.sessions.display(update.chat_id).await;
                let display = calculator::press(&display, key);
                let reply = calculator::render(&display);
                self.sessions.set_display(update.chat_id, display).await;
                reply
            }
            CallbackData::Collection(kind, action) => {
                self.collection_action(kind, update.user_id, action).await?
            }
            CallbackData::Translate(direction) => {
                self.sessions
                    .set_pending(update.user_id, PendingInput::Translation(direction))
                    .await;
                translate::direction_chosen(direction)
            }
            CallbackData::Timer(action) => timer::handle(&self.timers, update.chat_id, action).await,
        };
        Ok(Some(reply))
    }

    async fn on_text(&self, user: UserId, text: &str) -> Result<Option<Reply>> {
        let Some(pending) = self.sessions.pending(user).await else {
            debug!("user {} sent text with nothing pending", user);
            return Ok(None);
        };

        let reply = match pending {
            PendingInput::Add(kind) => self.collection_text(kind, user, text).await?,
            PendingInput::Translation(direction) => {
                self.sessions.clear_pending(user).await;
                translate::translate_text(self.translator.as_ref(), text, direction).await
            }
        };
        Ok(Some(reply))
    }

    async fn collection_action(
        &self,
        kind: Collection,
        user: UserId,
        action: CollectionAction,
    ) -> Result<Reply> {
        let (store, sessions) = (&self.store, &self.sessions);
        match kind {
            Collection::Cards => collections::handle_action::<Cards>(store, sessions, user, action).await,
            Collection::Events => {
                collections::handle_action::<Calendar>(store, sessions, user, action).await
            }
            Collection::Links => collections::handle_action::<Links>(store, sessions, user, action).await,
        }
    }

    async fn collection_text(&self, kind: Collection, user: UserId, text: &str) -> Result<Reply> {
        let (store, sessions) = (&self.store, &self.sessions);
        match kind {
            Collection::Cards => collections::handle_text::<Cards>(store, sessions, user, text).await,
            Collection::Events => collections::handle_text::<Calendar>(store, sessions, user, text).await,
            Collection::Links => collections::handle_text::<Links>(store, sessions, user, text).await,
        }
    }
}

#[async_trait]
impl UpdateHandler for Bot {
    async fn handle(&self, update: Update) -> Option<Reply> {
        match self.process(&update).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Exception while handling an update for chat {}: {}", update.chat_id, e);
                Some(Reply::text(menu::GENERIC_ERROR))
            }
        }
    }
}
