use satchel_store::Store;
use satchel_types::api::Collection;
use satchel_types::models::{Flashcard, UserId};

use crate::collections::{CollectionFeature, Texts};
use crate::parse::{self, ParseError};

pub struct Cards;

impl CollectionFeature for Cards {
    type Record = Flashcard;

    const KIND: Collection = Collection::Cards;
    const TEXTS: Texts = Texts {
        menu: "Flashcard menu:",
        add_button: "Add card",
        view_button: "View cards",
        delete_button: "Delete card",
        add_prompt: "Send me the card in this format:\n\nFront: [question]\nBack: [answer]",
        added: "Card added!",
        view_header: "Your cards:",
        empty: "You have no cards yet.",
        delete_prompt: "Choose a card to delete:",
        nothing_to_delete: "You have no cards to delete.",
        deleted: "Card deleted!",
        missing: "That card no longer exists.",
    };

    fn parse(text: &str) -> Result<Flashcard, ParseError> {
        parse::parse_card(text)
    }

    fn format_error(_: &ParseError) -> String {
        "Invalid format. Please use:\n\nFront: [question]\nBack: [answer]".to_string()
    }

    fn render(card: &Flashcard) -> String {
        format!("Front: {}\nBack: {}", card.front, card.back)
    }

    fn button_label(card: &Flashcard) -> String {
        card.front.clone()
    }

    fn append(store: &Store, user: UserId, card: Flashcard) -> satchel_store::Result<usize> {
        store.add_card(user, card)
    }

    fn list(store: &Store, user: UserId) -> satchel_store::Result<Vec<Flashcard>> {
        store.cards(user)
    }

    fn remove(store: &Store, user: UserId, index: usize) -> satchel_store::Result<Flashcard> {
        store.delete_card(user, index)
    }
}
