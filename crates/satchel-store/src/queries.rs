use satchel_types::models::{CalendarEvent, Flashcard, Link, UserId};

use crate::{Result, Store};

impl Store {
    // -- Flashcards --

    pub fn add_card(&self, user: UserId, card: Flashcard) -> Result<usize> {
        self.cards.append(user, card)
    }

    pub fn cards(&self, user: UserId) -> Result<Vec<Flashcard>> {
        self.cards.list(user)
    }

    pub fn delete_card(&self, user: UserId, index: usize) -> Result<Flashcard> {
        self.cards.remove(user, index)
    }

    // -- Calendar events --

    pub fn add_event(&self, user: UserId, event: CalendarEvent) -> Result<usize> {
        self.events.append(user, event)
    }

    pub fn events(&self, user: UserId) -> Result<Vec<CalendarEvent>> {
        self.events.list(user)
    }

    pub fn delete_event(&self, user: UserId, index: usize) -> Result<CalendarEvent> {
        self.events.remove(user, index)
    }

    // -- Links --

    pub fn add_link(&self, user: UserId, link: Link) -> Result<usize> {
        self.links.append(user, link)
    }

    pub fn links(&self, user: UserId) -> Result<Vec<Link>> {
        self.links.list(user)
    }

    pub fn delete_link(&self, user: UserId, index: usize) -> Result<Link> {
        self.links.remove(user, index)
    }
}
