use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use satchel_gateway::dispatcher::Dispatcher;
use satchel_types::api::{Button, CallbackData, Keyboard, Reply, TimerAction};
use satchel_types::models::ChatId;

/// Durations offered in the timer menu, in minutes.
pub const PRESETS: [u32; 2] = [20, 40];

pub const TIME_UP: &str = "⏰ Time is up!";
pub const CANCELLED: &str = "Timer cancelled.";
pub const NOTHING_TO_CANCEL: &str = "No active timer to cancel.";

struct ActiveTimer {
    id: Uuid,
    deadline: Instant,
    cancel: CancellationToken,
}

/// At most one countdown per chat.
///
/// Arming replaces the chat's timer; when a timer fires it delivers its
/// notice through the dispatcher and clears the slot if it still owns it.
#[derive(Clone)]
pub struct TimerRegistry {
    dispatcher: Dispatcher,
    /// Real length of one timer "minute"
    unit: Duration,
    timers: Arc<Mutex<HashMap<ChatId, ActiveTimer>>>,
}

impl TimerRegistry {
    pub fn new(dispatcher: Dispatcher, unit: Duration) -> Self {
        Self {
            dispatcher,
            unit,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a countdown, cancelling the chat's current one first.
    pub async fn arm(&self, chat_id: ChatId, minutes: u32) {
        let id = Uuid::new_v4();
        let deadline = Instant::now() + self.unit * minutes;
        let token = CancellationToken::new();

        let replaced = {
            let mut timers = self.timers.lock().await;
            let previous = timers.remove(&chat_id);
            if let Some(old) = &previous {
                old.cancel.cancel();
            }
            timers.insert(
                chat_id,
                ActiveTimer {
                    id,
                    deadline,
                    cancel: token.clone(),
                },
            );
            previous.is_some()
        };

        tokio::spawn(run_timer(
            self.timers.clone(),
            self.dispatcher.clone(),
            chat_id,
            id,
            deadline,
            token,
        ));

        if replaced {
            debug!("chat {} timer replaced", chat_id);
            self.dispatcher.post(chat_id, Reply::text(CANCELLED)).await;
        }
        info!("chat {} timer armed for {} minutes", chat_id, minutes);
        self.dispatcher
            .post(
                chat_id,
                Reply::text(format!(
                    "Timer set for {minutes} minutes. I'll let you know when time is up!"
                )),
            )
            .await;
    }

    /// Stop the chat's countdown. Returns whether one was running.
    pub async fn cancel(&self, chat_id: ChatId) -> bool {
        let Some(active) = self.timers.lock().await.remove(&chat_id) else {
            return false;
        };
        active.cancel.cancel();
        info!("chat {} timer cancelled", chat_id);
        self.dispatcher.post(chat_id, Reply::text(CANCELLED)).await;
        true
    }

    pub async fn remaining(&self, chat_id: ChatId) -> Option<Duration> {
        self.timers
            .lock()
            .await
            .get(&chat_id)
            .map(|t| t.deadline.saturating_duration_since(Instant::now()))
    }
}

async fn run_timer(
    timers: Arc<Mutex<HashMap<ChatId, ActiveTimer>>>,
    dispatcher: Dispatcher,
    chat_id: ChatId,
    id: Uuid,
    deadline: Instant,
    token: CancellationToken,
) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep_until(deadline) => {
            let fired = {
                let mut timers = timers.lock().await;
                if timers.get(&chat_id).is_some_and(|t| t.id == id) {
                    timers.remove(&chat_id);
                    true
                } else {
                    false
                }
            };
            if fired {
                info!("chat {} timer fired", chat_id);
                dispatcher.post(chat_id, Reply::text(TIME_UP)).await;
            }
        }
    }
}

// -- Handlers --

pub fn menu() -> Reply {
    let mut buttons: Vec<Button> = PRESETS
        .iter()
        .map(|&minutes| {
            Button::new(
                format!("{minutes} minutes"),
                CallbackData::Timer(TimerAction::Start { minutes }),
            )
        })
        .collect();
    buttons.push(Button::new(
        "Cancel timer",
        CallbackData::Timer(TimerAction::Cancel),
    ));
    Reply::text("Timer menu:").with_keyboard(Keyboard::column(buttons))
}

pub async fn handle(timers: &TimerRegistry, chat_id: ChatId, action: TimerAction) -> Reply {
    match action {
        TimerAction::Start { minutes } => {
            timers.arm(chat_id, minutes).await;
            Reply::text(format!("{minutes}-minute timer started!"))
        }
        TimerAction::Cancel => {
            if timers.cancel(chat_id).await {
                Reply::text(CANCELLED)
            } else {
                Reply::text(NOTHING_TO_CANCEL)
            }
        }
    }
}
