use satchel_types::api::Reply;

const COMMANDS: &str = "🔢 /calculator - Simple calculator\n\
                        📚 /cards - Flashcards for memorizing\n\
                        🌍 /translate - Translator (Russian → English/German/Chinese)\n\
                        📅 /calendar - Event reminders\n\
                        ⏱️ /timer - Set a timer (20 or 40 minutes)\n\
                        🔗 /links - Useful links for students\n\
                        ℹ️ /help - Show this message";

pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

pub fn start(first_name: &str) -> Reply {
    let greeting = if first_name.is_empty() {
        "Hi!".to_string()
    } else {
        format!("Hi, {first_name}!")
    };
    Reply::text(format!(
        "{greeting} I'm a multi-purpose assistant. Here's what I can do:\n\n{COMMANDS}"
    ))
}

pub fn help() -> Reply {
    Reply::text(format!("Available commands:\n\n{COMMANDS}"))
}
