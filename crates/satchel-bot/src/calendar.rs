use satchel_store::Store;
use satchel_types::api::Collection;
use satchel_types::models::{CalendarEvent, UserId};

use crate::collections::{CollectionFeature, Texts};
use crate::parse::{self, ParseError};

pub struct Calendar;

impl CollectionFeature for Calendar {
    type Record = CalendarEvent;

    const KIND: Collection = Collection::Events;
    const TEXTS: Texts = Texts {
        menu: "Calendar menu:",
        add_button: "Add event",
        view_button: "View events",
        delete_button: "Delete event",
        add_prompt: "Send me the event details in this format:\n\n\
                     Date: YYYY-MM-DD\nEvent: [description]\n\n\
                     Example:\nDate: 2023-12-25\nEvent: Christmas",
        added: "Event added!",
        view_header: "Your events:",
        empty: "You have no events yet.",
        delete_prompt: "Choose an event to delete:",
        nothing_to_delete: "You have no events to delete.",
        deleted: "Event deleted!",
        missing: "That event no longer exists.",
    };

    fn parse(text: &str) -> Result<CalendarEvent, ParseError> {
        parse::parse_event(text)
    }

    fn format_error(_: &ParseError) -> String {
        "Invalid format. Please use:\n\nDate: YYYY-MM-DD\nEvent: [description]".to_string()
    }

    fn render(event: &CalendarEvent) -> String {
        format!("Date: {}\nEvent: {}", event.date, event.description)
    }

    fn button_label(event: &CalendarEvent) -> String {
        format!("{} - {}", event.date, event.description)
    }

    fn append(store: &Store, user: UserId, event: CalendarEvent) -> satchel_store::Result<usize> {
        store.add_event(user, event)
    }

    fn list(store: &Store, user: UserId) -> satchel_store::Result<Vec<CalendarEvent>> {
        store.events(user)
    }

    fn remove(store: &Store, user: UserId, index: usize) -> satchel_store::Result<CalendarEvent> {
        store.delete_event(user, index)
    }
}
