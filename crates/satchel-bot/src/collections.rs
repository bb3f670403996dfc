//! Add / view / delete flow shared by flashcards, calendar events and links.

use std::sync::Arc;

use tracing::{debug, info};

use satchel_store::{Store, StoreError};
use satchel_types::api::{Button, CallbackData, Collection, CollectionAction, Keyboard, Reply};
use satchel_types::models::UserId;

use crate::error::{BotError, Result};
use crate::parse::ParseError;
use crate::session::{PendingInput, Sessions};

/// User-facing strings for one collection.
pub struct Texts {
    pub menu: &'static str,
    pub add_button: &'static str,
    pub view_button: &'static str,
    pub delete_button: &'static str,
    pub add_prompt: &'static str,
    pub added: &'static str,
    pub view_header: &'static str,
    pub empty: &'static str,
    pub delete_prompt: &'static str,
    pub nothing_to_delete: &'static str,
    pub deleted: &'static str,
    pub missing: &'static str,
}

pub const DELETE_CANCELLED: &str = "Deletion cancelled.";
pub const CANCEL_BUTTON: &str = "Cancel";

/// One per-user collection: how to parse, show and persist its records.
pub trait CollectionFeature: 'static {
    type Record: Send + 'static;

    const KIND: Collection;
    const TEXTS: Texts;

    fn parse(text: &str) -> std::result::Result<Self::Record, ParseError>;

    fn format_error(err: &ParseError) -> String;

    fn render(record: &Self::Record) -> String;

    fn button_label(record: &Self::Record) -> String;

    fn append(store: &Store, user: UserId, record: Self::Record) -> satchel_store::Result<usize>;

    fn list(store: &Store, user: UserId) -> satchel_store::Result<Vec<Self::Record>>;

    fn remove(store: &Store, user: UserId, index: usize) -> satchel_store::Result<Self::Record>;
}

/// Run a store operation off the async runtime.
pub(crate) async fn blocking<T, F>(store: &Arc<Store>, f: F) -> Result<T>
where
    F: FnOnce(&Store) -> satchel_store::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    Ok(tokio::task::spawn_blocking(move || f(&store)).await??)
}

pub fn menu<F: CollectionFeature>() -> Reply {
    let texts = F::TEXTS;
    let button = |label: &str, action| Button::new(label, CallbackData::Collection(F::KIND, action));
    Reply::text(texts.menu).with_keyboard(Keyboard::column([
        button(texts.add_button, CollectionAction::Add),
        button(texts.view_button, CollectionAction::View),
        button(texts.delete_button, CollectionAction::DeleteMenu),
    ]))
}

pub async fn handle_action<F: CollectionFeature>(
    store: &Arc<Store>,
    sessions: &Sessions,
    user: UserId,
    action: CollectionAction,
) -> Result<Reply> {
    let texts = F::TEXTS;
    match action {
        CollectionAction::Add => {
            sessions.set_pending(user, PendingInput::Add(F::KIND)).await;
            Ok(Reply::text(texts.add_prompt))
        }

        CollectionAction::View => {
            let records = blocking(store, move |s| F::list(s, user)).await?;
            if records.is_empty() {
                return Ok(Reply::text(texts.empty));
            }
            let body = records.iter().map(F::render).collect::<Vec<_>>().join("\n\n");
            Ok(Reply::text(format!("{}\n\n{}", texts.view_header, body)))
        }

        CollectionAction::DeleteMenu => {
            let records = blocking(store, move |s| F::list(s, user)).await?;
            if records.is_empty() {
                return Ok(Reply::text(texts.nothing_to_delete));
            }
            let mut buttons: Vec<Button> = records
                .iter()
                .enumerate()
                .map(|(idx, record)| {
                    Button::new(
                        F::button_label(record),
                        CallbackData::Collection(F::KIND, CollectionAction::Delete(idx)),
                    )
                })
                .collect();
            buttons.push(Button::new(
                CANCEL_BUTTON,
                CallbackData::Collection(F::KIND, CollectionAction::CancelDelete),
            ));
            Ok(Reply::text(texts.delete_prompt).with_keyboard(Keyboard::column(buttons)))
        }

        CollectionAction::Delete(index) => {
            match blocking(store, move |s| F::remove(s, user, index)).await {
                Ok(_) => {
                    info!("user {} deleted {:?} record {}", user, F::KIND, index);
                    Ok(Reply::text(texts.deleted))
                }
                Err(BotError::Store(StoreError::IndexOutOfRange { .. })) => {
                    debug!("user {} asked to delete stale {:?} index {}", user, F::KIND, index);
                    Ok(Reply::text(texts.missing))
                }
                Err(e) => Err(e),
            }
        }

        CollectionAction::CancelDelete => Ok(Reply::text(DELETE_CANCELLED)),
    }
}

/// Feed the user's text into an add flow. A malformed text keeps the flow
/// open so the user can try again.
pub async fn handle_text<F: CollectionFeature>(
    store: &Arc<Store>,
    sessions: &Sessions,
    user: UserId,
    text: &str,
) -> Result<Reply> {
    let record = match F::parse(text) {
        Ok(record) => record,
        Err(e) => {
            debug!("user {} sent malformed {:?}: {}", user, F::KIND, e);
            return Ok(Reply::text(F::format_error(&e)));
        }
    };

    let count = blocking(store, move |s| F::append(s, user, record)).await?;
    sessions.clear_pending(user).await;
    info!("user {} added {:?} record (now {})", user, F::KIND, count);
    Ok(Reply::text(F::TEXTS.added))
}
