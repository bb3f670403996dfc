//! Parsers for the fixed two-line formats users type when adding records.
//!
//! Each format is `<Label1>: value` followed by `<Label2>: value`. Labels are
//! matched literally. The first value runs from its label to the second label;
//! the second value runs to the end of the text (or to a repeat of its label).

use chrono::NaiveDate;
use thiserror::Error;

use satchel_types::models::{CalendarEvent, Flashcard, Link};

pub const CARD_FRONT: &str = "Front:";
pub const CARD_BACK: &str = "Back:";
pub const EVENT_DATE: &str = "Date:";
pub const EVENT_TEXT: &str = "Event:";
pub const LINK_TITLE: &str = "Title:";
pub const LINK_URL: &str = "URL:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing \"{0}\" field")]
    MissingField(&'static str),

    #[error("\"{0}\" is empty")]
    EmptyField(&'static str),

    #[error("invalid date \"{0}\", expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("URL must start with http:// or https://")]
    UnsupportedScheme,
}

pub fn parse_card(text: &str) -> Result<Flashcard, ParseError> {
    let (front, back) = two_fields(text, CARD_FRONT, CARD_BACK)?;
    Ok(Flashcard::new(front, back))
}

pub fn parse_event(text: &str) -> Result<CalendarEvent, ParseError> {
    let (date, description) = two_fields(text, EVENT_DATE, EVENT_TEXT)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ParseError::InvalidDate(date.to_string()))?;
    Ok(CalendarEvent::new(date, description))
}

pub fn parse_link(text: &str) -> Result<Link, ParseError> {
    let (title, url) = two_fields(text, LINK_TITLE, LINK_URL)?;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ParseError::UnsupportedScheme);
    }
    Ok(Link::new(title, url))
}

fn two_fields<'a>(
    text: &'a str,
    first: &'static str,
    second: &'static str,
) -> Result<(&'a str, &'a str), ParseError> {
    let head = segment(text, first).ok_or(ParseError::MissingField(first))?;
    let head = head.split_once(second).map_or(head, |(before, _)| before);
    let tail = segment(text, second).ok_or(ParseError::MissingField(second))?;

    let head = head.trim();
    let tail = tail.trim();
    if head.is_empty() {
        return Err(ParseError::EmptyField(first));
    }
    if tail.is_empty() {
        return Err(ParseError::EmptyField(second));
    }
    Ok((head, tail))
}

/// Text after the first `label`, up to its next occurrence.
fn segment<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let (_, rest) = text.split_once(label)?;
    Some(rest.split_once(label).map_or(rest, |(before, _)| before))
}
