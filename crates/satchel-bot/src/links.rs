use satchel_store::Store;
use satchel_types::api::Collection;
use satchel_types::models::{Link, UserId};

use crate::collections::{CollectionFeature, Texts};
use crate::parse::{self, ParseError};

pub struct Links;

impl CollectionFeature for Links {
    type Record = Link;

    const KIND: Collection = Collection::Links;
    const TEXTS: Texts = Texts {
        menu: "Useful links menu:",
        add_button: "Add link",
        view_button: "View links",
        delete_button: "Delete link",
        add_prompt: "Send me the link details in this format:\n\n\
                     Title: [name]\nURL: [link]\n\n\
                     Example:\nTitle: Rust documentation\nURL: https://doc.rust-lang.org",
        added: "Link added!",
        view_header: "Your saved links:",
        empty: "You have no saved links yet.",
        delete_prompt: "Choose a link to delete:",
        nothing_to_delete: "You have no links to delete.",
        deleted: "Link deleted!",
        missing: "That link no longer exists.",
    };

    fn parse(text: &str) -> Result<Link, ParseError> {
        parse::parse_link(text)
    }

    fn format_error(err: &ParseError) -> String {
        format!("Invalid format or URL. Please use:\n\nTitle: [name]\nURL: [link]\n\nError: {err}")
    }

    fn render(link: &Link) -> String {
        format!("Title: {}\nURL: {}", link.title, link.url)
    }

    fn button_label(link: &Link) -> String {
        link.title.clone()
    }

    fn append(store: &Store, user: UserId, link: Link) -> satchel_store::Result<usize> {
        store.add_link(user, link)
    }

    fn list(store: &Store, user: UserId) -> satchel_store::Result<Vec<Link>> {
        store.links(user)
    }

    fn remove(store: &Store, user: UserId, index: usize) -> satchel_store::Result<Link> {
        store.delete_link(user, index)
    }
}
