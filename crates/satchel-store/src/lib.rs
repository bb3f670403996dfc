pub mod collection;
pub mod queries;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use satchel_types::models::{CalendarEvent, Flashcard, Link};

pub use collection::{Document, JsonCollection};

pub const CARDS_FILE: &str = "memory_cards.json";
pub const CALENDAR_FILE: &str = "calendar_events.json";
pub const LINKS_FILE: &str = "useful_links.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no record at index {index} (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("collection lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The three per-user collections, each backed by one JSON file.
pub struct Store {
    dir: PathBuf,
    cards: JsonCollection<Flashcard>,
    events: JsonCollection<CalendarEvent>,
    links: JsonCollection<Link>,
}

impl Store {
    /// Open (and initialize, if needed) the collections under `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let store = Self {
            dir: dir.to_path_buf(),
            cards: JsonCollection::open(dir.join(CARDS_FILE))?,
            events: JsonCollection::open(dir.join(CALENDAR_FILE))?,
            links: JsonCollection::open(dir.join(LINKS_FILE))?,
        };

        info!("Store opened at {}", dir.display());
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_initializes_empty_documents() {
        let dir = std::env::temp_dir().join(format!("satchel_store_{}", uuid::Uuid::new_v4()));
        let store = Store::open(&dir).unwrap();

        for name in [CARDS_FILE, CALENDAR_FILE, LINKS_FILE] {
            let raw = fs::read_to_string(dir.join(name)).unwrap();
            assert_eq!(raw.trim(), "{}");
        }
        assert_eq!(store.dir(), dir.as_path());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn open_keeps_existing_data() {
        let dir = std::env::temp_dir().join(format!("satchel_store_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(LINKS_FILE),
            r#"{"7": [{"title": "Docs", "url": "https://docs.rs", "created_at": "2024-03-01 09:00:00.5"}]}"#,
        )
        .unwrap();

        let store = Store::open(&dir).unwrap();
        let links = store.links(satchel_types::models::UserId(7)).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://docs.rs");

        let _ = fs::remove_dir_all(&dir);
    }
}
