use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ChatId, UserId};

// -- JWT Claims --

/// Claims carried by the token a client presents in `Identify`. Whoever holds
/// the signing secret (the chat front end) vouches for the user and chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub chat_id: ChatId,
    #[serde(default)]
    pub first_name: String,
    pub exp: usize,
}

// -- Replies --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: CallbackData) -> Self {
        Self {
            label: label.into(),
            data: data.to_string(),
        }
    }
}

/// Inline buttons attached to a message, laid out row by row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        self.rows.push(buttons.into_iter().collect());
        self
    }

    /// One button per row.
    pub fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// What a handler wants shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

// -- Callback payloads --

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown callback payload: {0}")]
pub struct UnknownCallback(pub String);

/// A calculator button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcKey {
    Digit(u8),
    Plus,
    Minus,
    Multiply,
    Divide,
    Dot,
    Equals,
    Clear,
    Backspace,
}

impl CalcKey {
    pub fn symbol(self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Plus => '+',
            Self::Minus => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
            Self::Dot => '.',
            Self::Equals => '=',
            Self::Clear => 'C',
            Self::Backspace => '⌫',
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        Some(match c {
            '0'..='9' => Self::Digit(c as u8 - b'0'),
            '+' => Self::Plus,
            '-' => Self::Minus,
            '*' => Self::Multiply,
            '/' => Self::Divide,
            '.' => Self::Dot,
            '=' => Self::Equals,
            'C' => Self::Clear,
            '⌫' => Self::Backspace,
            _ => return None,
        })
    }
}

/// The three per-user collections share one menu shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Cards,
    Events,
    Links,
}

impl Collection {
    /// Payload stems: (add, view, delete menu, delete prefix, cancel).
    fn stems(self) -> (&'static str, &'static str, &'static str, &'static str, &'static str) {
        match self {
            Self::Cards => ("add_card", "view_cards", "delete_card", "delete_", "cancel_delete"),
            Self::Events => (
                "add_event",
                "view_events",
                "delete_event",
                "delete_event_",
                "cancel_delete_event",
            ),
            Self::Links => (
                "add_link",
                "view_links",
                "delete_link",
                "delete_link_",
                "cancel_delete_link",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionAction {
    Add,
    View,
    DeleteMenu,
    Delete(usize),
    CancelDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Russian,
    English,
    German,
    Chinese,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::Russian => "ru",
            Self::English => "en",
            Self::German => "de",
            Self::Chinese => "zh",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Russian => "Russian",
            Self::English => "English",
            Self::German => "German",
            Self::Chinese => "Chinese",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ru" => Some(Self::Russian),
            "en" => Some(Self::English),
            "de" => Some(Self::German),
            "zh" => Some(Self::Chinese),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Direction {
    pub source: Language,
    pub target: Language,
}

impl Direction {
    pub const fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start { minutes: u32 },
    Cancel,
}

/// Every button payload the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    Calc(CalcKey),
    Collection(Collection, CollectionAction),
    Translate(Direction),
    Timer(TimerAction),
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calc(key) => write!(f, "{}", key.symbol()),
            Self::Collection(collection, action) => {
                let (add, view, menu, delete, cancel) = collection.stems();
                match action {
                    CollectionAction::Add => f.write_str(add),
                    CollectionAction::View => f.write_str(view),
                    CollectionAction::DeleteMenu => f.write_str(menu),
                    CollectionAction::Delete(idx) => write!(f, "{delete}{idx}"),
                    CollectionAction::CancelDelete => f.write_str(cancel),
                }
            }
            Self::Translate(dir) => write!(f, "{}_{}", dir.source.code(), dir.target.code()),
            Self::Timer(TimerAction::Start { minutes }) => write!(f, "timer_{minutes}"),
            Self::Timer(TimerAction::Cancel) => f.write_str("cancel_timer"),
        }
    }
}

impl FromStr for CallbackData {
    type Err = UnknownCallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownCallback(s.to_string());

        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return CalcKey::from_symbol(c).map(Self::Calc).ok_or_else(unknown);
        }

        for collection in [Collection::Cards, Collection::Events, Collection::Links] {
            let (add, view, menu, delete, cancel) = collection.stems();
            let action = if s == add {
                Some(CollectionAction::Add)
            } else if s == view {
                Some(CollectionAction::View)
            } else if s == menu {
                Some(CollectionAction::DeleteMenu)
            } else if s == cancel {
                Some(CollectionAction::CancelDelete)
            } else {
                s.strip_prefix(delete)
                    .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|rest| rest.parse().ok())
                    .map(CollectionAction::Delete)
            };
            if let Some(action) = action {
                return Ok(Self::Collection(collection, action));
            }
        }

        if s == "cancel_timer" {
            return Ok(Self::Timer(TimerAction::Cancel));
        }
        if let Some(minutes) = s.strip_prefix("timer_") {
            let minutes: u32 = minutes.parse().map_err(|_| unknown())?;
            if minutes == 0 {
                return Err(unknown());
            }
            return Ok(Self::Timer(TimerAction::Start { minutes }));
        }

        if let Some((source, target)) = s.split_once('_') {
            if let (Some(source), Some(target)) = (Language::from_code(source), Language::from_code(target)) {
                return Ok(Self::Translate(Direction::new(source, target)));
            }
        }

        Err(unknown())
    }
}
