use std::sync::Arc;

use async_trait::async_trait;

use super::fetch::NewsItem;
use crate::clients::telegram::TelegramClient;
use crate::util::text::escape_html;

/// Notifier interface: deliver one formatted item to one target.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: &str, item: &NewsItem) -> anyhow::Result<()>;
}

/// Telegram配信の実装。見出しを太字、要約を斜体、ソースをリンクとして
/// HTMLメッセージに整形する。
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
    channel_handle: String,
}

impl TelegramNotifier {
    #[must_use]
    pub fn new(client: Arc<TelegramClient>, channel_handle: impl Into<String>) -> Self {
        Self {
            client,
            channel_handle: channel_handle.into(),
        }
    }

    fn format_message(&self, item: &NewsItem) -> String {
        format!(
            "<b>{}</b>\n\n<i>{}</i>\n\nChannel: {}\n\n<a href=\"{}\">Source</a>",
            escape_html(&item.headline),
            escape_html(&item.summary),
            self.channel_handle,
            escape_html(&item.source_url),
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: &str, item: &NewsItem) -> anyhow::Result<()> {
        let text = self.format_message(item);
        self.client.send_message(chat_id, &text).await?;
        Ok(())
    }
}
