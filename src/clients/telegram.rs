/// Telegram Bot APIクライアント。
///
/// 配信（sendMessage）とコマンド受信（getUpdatesロングポーリング）のみを扱う。
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Telegram API errors
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Telegram API returned an error
    #[error("Telegram API error: {0}")]
    Api(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API client
pub struct TelegramClient {
    client: Client,
    base_url: String,
    bot_token: String,
}

impl TelegramClient {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, bot_token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            bot_token: bot_token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.bot_token)
    }

    /// Send an HTML-formatted text message to one chat.
    ///
    /// `chat_id` may be a numeric id or a `@channel` handle.
    ///
    /// # Errors
    /// Returns an error when the request fails or Telegram rejects the message.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML"
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(TelegramError::Api(error_text));
        }

        Ok(())
    }

    /// Long-poll for updates with ids at or above `offset`.
    ///
    /// # Errors
    /// Returns an error when the request fails or the envelope reports `ok: false`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>, TelegramError> {
        let resp = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"]
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(TelegramError::Api(error_text));
        }

        let envelope = resp.json::<ApiEnvelope<Vec<TelegramUpdate>>>().await?;
        if !envelope.ok {
            return Err(TelegramError::Api(
                envelope.description.unwrap_or_default(),
            ));
        }

        Ok(envelope.result.unwrap_or_default())
    }
}
