use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use satchel_bot::Bot;
use satchel_bot::menu::GENERIC_ERROR;
use satchel_bot::timer::TIME_UP;
use satchel_bot::translate::{TranslateError, Translator};
use satchel_gateway::UpdateHandler;
use satchel_gateway::dispatcher::Dispatcher;
use satchel_store::Store;
use satchel_types::api::Direction;
use satchel_types::events::{GatewayEvent, Update, UpdateKind};
use satchel_types::models::{ChatId, UserId};

const CHAT: ChatId = ChatId(100);
const USER: UserId = UserId(7);

struct Echo;

#[async_trait]
impl Translator for Echo {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String, TranslateError> {
        if text == "fail" {
            return Err(TranslateError::Service("service unavailable".into()));
        }
        Ok(format!("[{}] {}", direction.target.code(), text))
    }
}

struct Harness {
    bot: Bot,
    dir: PathBuf,
    rx: UnboundedReceiver<GatewayEvent>,
}

impl Harness {
    async fn new(timer_unit: Duration) -> Self {
        let dir = std::env::temp_dir().join(format!("satchel-bot-{}", uuid::Uuid::new_v4()));
        let store = Arc::new(Store::open(&dir).unwrap());
        let dispatcher = Dispatcher::new();
        let (_, rx) = dispatcher.register_chat_channel(CHAT).await;
        let bot = Bot::new(store, dispatcher, Arc::new(Echo), timer_unit);
        Self { bot, dir, rx }
    }

    async fn send(&self, kind: UpdateKind) -> Option<String> {
        let update = Update {
            chat_id: CHAT,
            user_id: USER,
            first_name: "Ada".into(),
            kind,
        };
        self.bot.handle(update).await.map(|reply| reply.text)
    }

    async fn command(&self, name: &str) -> String {
        self.send(UpdateKind::Command(name.into())).await.unwrap()
    }

    async fn press(&self, data: &str) -> Option<String> {
        self.send(UpdateKind::Callback {
            message_id: 1,
            data: data.into(),
        })
        .await
    }

    async fn say(&self, text: &str) -> Option<String> {
        self.send(UpdateKind::Text(text.into())).await
    }

    fn notices(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            if let GatewayEvent::MessageCreate { text, .. } = event {
                out.push(text);
            }
        }
        out
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

#[tokio::test]
async fn card_add_then_view() {
    let h = Harness::new(Duration::from_secs(60)).await;

    assert_eq!(h.command("cards").await, "Flashcard menu:");
    let prompt = h.press("add_card").await.unwrap();
    assert!(prompt.starts_with("Send me the card"));

    assert_eq!(h.say("Front: capital of France\nBack: Paris").await.unwrap(), "Card added!");
    assert_eq!(
        h.press("view_cards").await.unwrap(),
        "Your cards:\n\nFront: capital of France\nBack: Paris"
    );

    // The add flow is over, so a stray text is ignored
    assert_eq!(h.say("Front: a\nBack: b").await, None);
}

#[tokio::test]
async fn malformed_text_keeps_the_flow_open() {
    let h = Harness::new(Duration::from_secs(60)).await;

    h.press("add_event").await.unwrap();
    let err = h.say("Date: 25.12.2023\nEvent: Christmas").await.unwrap();
    assert!(err.starts_with("Invalid format."));
    assert_eq!(h.press("view_events").await.unwrap(), "You have no events yet.");

    h.press("add_event").await.unwrap();
    assert_eq!(h.say("Date: 2023-12-25\nEvent: Christmas").await.unwrap(), "Event added!");
    assert_eq!(
        h.press("view_events").await.unwrap(),
        "Your events:\n\nDate: 2023-12-25\nEvent: Christmas"
    );
}

#[tokio::test]
async fn retry_after_parse_error() {
    let h = Harness::new(Duration::from_secs(60)).await;

    h.press("add_link").await.unwrap();
    let err = h.say("Title: Docs\nURL: ftp://example.com").await.unwrap();
    assert!(err.contains("\n\nError: "));
    assert_eq!(h.say("Title: Docs\nURL: https://docs.rs").await.unwrap(), "Link added!");
}

#[tokio::test]
async fn delete_by_index_keeps_order() {
    let h = Harness::new(Duration::from_secs(60)).await;

    for (front, back) in [("one", "1"), ("two", "2"), ("three", "3")] {
        h.press("add_card").await.unwrap();
        h.say(&format!("Front: {front}\nBack: {back}")).await.unwrap();
    }

    assert_eq!(h.press("delete_card").await.unwrap(), "Choose a card to delete:");
    assert_eq!(h.press("delete_1").await.unwrap(), "Card deleted!");
    assert_eq!(
        h.press("view_cards").await.unwrap(),
        "Your cards:\n\nFront: one\nBack: 1\n\nFront: three\nBack: 3"
    );

    // Index 2 no longer exists after the delete
    assert_eq!(h.press("delete_2").await.unwrap(), "That card no longer exists.");
    assert_eq!(h.press("cancel_delete").await.unwrap(), "Deletion cancelled.");
}

#[tokio::test]
async fn empty_collections() {
    let h = Harness::new(Duration::from_secs(60)).await;

    assert_eq!(h.press("view_links").await.unwrap(), "You have no saved links yet.");
    assert_eq!(h.press("delete_link").await.unwrap(), "You have no links to delete.");
}

#[tokio::test]
async fn choosing_a_new_flow_replaces_the_old_one() {
    let h = Harness::new(Duration::from_secs(60)).await;

    h.press("add_card").await.unwrap();
    h.press("ru_de").await.unwrap();
    assert_eq!(h.say("Front: x\nBack: y").await.unwrap(), "Translation:\n\n[de] Front: x\nBack: y");
    assert_eq!(h.press("view_cards").await.unwrap(), "You have no cards yet.");
}

#[tokio::test]
async fn translation_is_one_shot() {
    let h = Harness::new(Duration::from_secs(60)).await;

    assert_eq!(
        h.press("ru_en").await.unwrap(),
        "Selected: RU → EN\n\nSend me the text to translate."
    );
    assert_eq!(
        h.say("fail").await.unwrap(),
        "Translation error: service unavailable"
    );
    assert_eq!(h.say("привет").await, None);
}

#[tokio::test]
async fn calculator_adds() {
    let h = Harness::new(Duration::from_secs(60)).await;

    assert_eq!(h.command("calculator").await, "Calculator:\n0");
    h.press("7").await.unwrap();
    h.press("+").await.unwrap();
    assert_eq!(h.press("8").await.unwrap(), "Calculator:\n7+8");
    assert_eq!(h.press("=").await.unwrap(), "Calculator:\n15");

    h.press("/").await.unwrap();
    h.press("0").await.unwrap();
    assert_eq!(h.press("=").await.unwrap(), "Calculator:\nError");
    assert_eq!(h.press("C").await.unwrap(), "Calculator:\n0");
}

#[tokio::test]
async fn start_and_unknown_input() {
    let h = Harness::new(Duration::from_secs(60)).await;

    assert!(h.command("start").await.starts_with("Hi, Ada!"));
    assert!(h.command("frobnicate").await.starts_with("Available commands:"));
    assert_eq!(h.press("no_such_button").await, None);
}

#[tokio::test(start_paused = true)]
async fn timer_rearm_delivers_one_notice() {
    let mut h = Harness::new(Duration::from_secs(1)).await;

    assert_eq!(h.command("timer").await, "Timer menu:");
    assert_eq!(h.press("timer_20").await.unwrap(), "20-minute timer started!");
    assert_eq!(h.press("timer_40").await.unwrap(), "40-minute timer started!");

    tokio::time::sleep(Duration::from_secs(41)).await;
    let notices = h.notices();
    assert_eq!(notices.iter().filter(|t| t.as_str() == TIME_UP).count(), 1);
    assert_eq!(h.press("cancel_timer").await.unwrap(), "No active timer to cancel.");
}

#[tokio::test]
async fn storage_failure_gives_generic_error() {
    let h = Harness::new(Duration::from_secs(60)).await;

    // A directory where the cards file should be makes every read fail
    let cards = h.dir.join("memory_cards.json");
    std::fs::remove_file(&cards).unwrap();
    std::fs::create_dir(&cards).unwrap();

    assert_eq!(h.press("view_cards").await.unwrap(), GENERIC_ERROR);
}
