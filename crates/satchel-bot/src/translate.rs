use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use satchel_types::api::{Button, CallbackData, Direction, Keyboard, Language, Reply};

/// Directions offered in the translator menu.
pub const DIRECTIONS: [Direction; 3] = [
    Direction::new(Language::Russian, Language::English),
    Direction::new(Language::Russian, Language::German),
    Direction::new(Language::Russian, Language::Chinese),
];

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Service(String),
}

/// The external translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String, TranslateError>;
}

/// Client for a LibreTranslate-compatible `POST /translate` endpoint.
pub struct HttpTranslator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Deserialize)]
struct ServiceError {
    error: String,
}

impl HttpTranslator {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, direction: Direction) -> Result<String, TranslateError> {
        let url = format!("{}/translate", self.base_url);
        let body = TranslateRequest {
            q: text,
            source: direction.source.code(),
            target: direction.target.code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        debug!(
            "translating {} chars {} -> {}",
            text.chars().count(),
            body.source,
            body.target
        );
        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<ServiceError>().await {
                Ok(err) => err.error,
                Err(_) => status.to_string(),
            };
            return Err(TranslateError::Service(message));
        }

        let parsed: TranslateResponse = resp.json().await?;
        Ok(parsed.translated_text)
    }
}

// -- Handlers --

pub fn menu() -> Reply {
    let buttons = DIRECTIONS.map(|dir| {
        Button::new(
            format!("{} → {}", dir.source.name(), dir.target.name()),
            CallbackData::Translate(dir),
        )
    });
    Reply::text("Choose a translation direction:").with_keyboard(Keyboard::column(buttons))
}

pub fn direction_chosen(direction: Direction) -> Reply {
    Reply::text(format!(
        "Selected: {} → {}\n\nSend me the text to translate.",
        direction.source.code().to_uppercase(),
        direction.target.code().to_uppercase()
    ))
}

/// Run one translation. Failures become a reply carrying the service's message.
pub async fn translate_text(translator: &dyn Translator, text: &str, direction: Direction) -> Reply {
    match translator.translate(text, direction).await {
        Ok(translated) => Reply::text(format!("Translation:\n\n{translated}")),
        Err(e) => Reply::text(format!("Translation error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    #[async_trait]
    impl Translator for Upper {
        async fn translate(&self, text: &str, _: Direction) -> Result<String, TranslateError> {
            Ok(text.to_uppercase())
        }
    }

    struct Down;

    #[async_trait]
    impl Translator for Down {
        async fn translate(&self, _: &str, _: Direction) -> Result<String, TranslateError> {
            Err(TranslateError::Service("quota exceeded".into()))
        }
    }

    #[tokio::test]
    async fn success_and_failure_replies() {
        let ok = translate_text(&Upper, "privet", DIRECTIONS[0]).await;
        assert_eq!(ok.text, "Translation:\n\nPRIVET");

        let err = translate_text(&Down, "privet", DIRECTIONS[0]).await;
        assert_eq!(err.text, "Translation error: quota exceeded");
    }

    #[test]
    fn menu_offers_three_directions() {
        let menu = menu();
        let data: Vec<&str> = menu
            .keyboard
            .as_ref()
            .unwrap()
            .buttons()
            .map(|b| b.data.as_str())
            .collect();
        assert_eq!(data, ["ru_en", "ru_de", "ru_zh"]);
    }

    #[test]
    fn request_body_shape() {
        let body = TranslateRequest {
            q: "привет",
            source: "ru",
            target: "en",
            format: "text",
            api_key: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["q"], "привет");
        assert!(json.get("api_key").is_none());
    }
}
