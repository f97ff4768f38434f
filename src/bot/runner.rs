use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::auth::AuthorizationPolicy;
use super::commands::Command;
use crate::clients::telegram::{TelegramClient, TelegramMessage};
use crate::scheduler::{Scheduler, Trigger, TriggerOutcome};
use crate::store::dao::{AddOutcome, BroadcastDao, RemoveOutcome};

const WELCOME_TEXT: &str = "Welcome to Canary Reports!\n\
 /help - Opens this menu\n\
 /subscribe - Subscribes to our automated news reports\n\
 /unsubscribe - Unsubscribes from our automated news reports";

/// getUpdates失敗時のバックオフ。次のポーリングまでの待機時間。
const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// コマンド面のロングポーリングランナー。
///
/// subscribe/unsubscribeは購読者ストアへの単純なCRUD、/newsはスケジューラの
/// 手動トリガー入口を叩くだけで、パイプライン本体には触れない。
pub struct BotRunner {
    telegram: Arc<TelegramClient>,
    dao: Arc<dyn BroadcastDao>,
    scheduler: Scheduler,
    policy: AuthorizationPolicy,
    poll_timeout_secs: u64,
}

impl BotRunner {
    #[must_use]
    pub fn new(
        telegram: Arc<TelegramClient>,
        dao: Arc<dyn BroadcastDao>,
        scheduler: Scheduler,
        policy: AuthorizationPolicy,
        poll_timeout_secs: u64,
    ) -> Self {
        Self {
            telegram,
            dao,
            scheduler,
            policy,
            poll_timeout_secs,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        info!("bot command loop started");
        let mut offset = 0i64;

        loop {
            let updates = match self
                .telegram
                .get_updates(offset, self.poll_timeout_secs)
                .await
            {
                Ok(updates) => updates,
                Err(err) => {
                    warn!(error = %err, "getUpdates failed, backing off");
                    tokio::time::sleep(POLL_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                if let Err(err) = self.handle_message(&message).await {
                    error!(error = format!("{err:#}"), "command handling failed");
                }
            }
        }
    }

    /// Dispatch one incoming message. Unknown texts are ignored silently;
    /// user-visible failures become direct replies, never stack traces.
    pub async fn handle_message(&self, message: &TelegramMessage) -> Result<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let Some(command) = Command::parse(text) else {
            return Ok(());
        };

        let chat_id = message.chat.id.to_string();
        let caller_id = message
            .from
            .as_ref()
            .map(|user| user.id.to_string())
            .unwrap_or_default();

        match command {
            Command::Start | Command::Help => self.reply(&chat_id, WELCOME_TEXT).await,
            Command::Subscribe => {
                if !self.policy.is_authorized(&caller_id) {
                    return self.reply(&chat_id, "You are not licensed.").await;
                }
                match self.dao.add_subscriber(&chat_id).await? {
                    AddOutcome::Added => self.reply(&chat_id, "You're subscribed!").await,
                    AddOutcome::AlreadyPresent => {
                        self.reply(&chat_id, "You're already subscribed!").await
                    }
                }
            }
            Command::Unsubscribe => match self.dao.remove_subscriber(&chat_id).await? {
                RemoveOutcome::Removed => self.reply(&chat_id, "You're unsubscribed!").await,
                RemoveOutcome::NotPresent => self.reply(&chat_id, "You are not subscribed!").await,
                RemoveOutcome::Protected => {
                    self.reply(&chat_id, "The broadcast channel cannot unsubscribe.")
                        .await
                }
            },
            Command::News => {
                if !self.policy.is_authorized(&caller_id) {
                    return self
                        .reply(&chat_id, "You are not authorized to do that!")
                        .await;
                }
                match self.scheduler.trigger(Trigger::Manual) {
                    TriggerOutcome::Queued => self.reply(&chat_id, "Broadcast triggered.").await,
                    TriggerOutcome::Dropped => {
                        self.reply(&chat_id, "A broadcast is already running.").await
                    }
                }
            }
        }
    }

    async fn reply(&self, chat_id: &str, text: &str) -> Result<()> {
        self.telegram.send_message(chat_id, text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::telegram::{TelegramChat, TelegramUser};
    use crate::store::dao::mock::MockBroadcastDao;
    use reqwest::Client;
    use serde_json::json;
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(chat_id: i64, user_id: i64, text: &str) -> TelegramMessage {
        TelegramMessage {
            chat: TelegramChat { id: chat_id },
            from: Some(TelegramUser { id: user_id }),
            text: Some(text.to_string()),
        }
    }

    async fn runner_against(
        server: &MockServer,
        dao: Arc<MockBroadcastDao>,
    ) -> (BotRunner, mpsc::Receiver<Trigger>) {
        let (sender, receiver) = mpsc::channel(1);
        let telegram = Arc::new(TelegramClient::new(Client::new(), server.uri(), "123:abc"));
        let runner = BotRunner::new(
            telegram,
            dao,
            Scheduler::new(sender),
            AuthorizationPolicy::new(vec!["555".to_string()]),
            0,
        );
        (runner, receiver)
    }

    async fn expect_reply(server: &MockServer, text: &str) {
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(json!({ "text": text })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn subscribe_from_licensed_caller_adds_chat() {
        let server = MockServer::start().await;
        expect_reply(&server, "You're subscribed!").await;
        let dao = Arc::new(MockBroadcastDao::new("@CanaryReports"));
        let (runner, _receiver) = runner_against(&server, Arc::clone(&dao)).await;

        runner
            .handle_message(&message(100, 555, "/subscribe"))
            .await
            .expect("handled");

        let subscribers = dao.list_subscribers().await.expect("list");
        assert!(subscribers.contains(&"100".to_string()));
    }

    #[tokio::test]
    async fn subscribe_from_unlicensed_caller_is_rejected() {
        let server = MockServer::start().await;
        expect_reply(&server, "You are not licensed.").await;
        let dao = Arc::new(MockBroadcastDao::new("@CanaryReports"));
        let (runner, _receiver) = runner_against(&server, Arc::clone(&dao)).await;

        runner
            .handle_message(&message(100, 999, "/subscribe"))
            .await
            .expect("handled");

        let subscribers = dao.list_subscribers().await.expect("list");
        assert!(!subscribers.contains(&"100".to_string()));
    }

    #[tokio::test]
    async fn news_from_licensed_caller_queues_manual_trigger() {
        let server = MockServer::start().await;
        expect_reply(&server, "Broadcast triggered.").await;
        let dao = Arc::new(MockBroadcastDao::new("@CanaryReports"));
        let (runner, mut receiver) = runner_against(&server, dao).await;

        runner
            .handle_message(&message(100, 555, "/news"))
            .await
            .expect("handled");

        assert_eq!(receiver.try_recv().expect("trigger queued"), Trigger::Manual);
    }

    #[tokio::test]
    async fn unsubscribe_missing_chat_reports_not_subscribed() {
        let server = MockServer::start().await;
        expect_reply(&server, "You are not subscribed!").await;
        let dao = Arc::new(MockBroadcastDao::new("@CanaryReports"));
        let (runner, _receiver) = runner_against(&server, dao).await;

        runner
            .handle_message(&message(100, 999, "/unsubscribe"))
            .await
            .expect("handled");
    }

    #[tokio::test]
    async fn non_command_text_is_ignored() {
        let server = MockServer::start().await;
        let dao = Arc::new(MockBroadcastDao::new("@CanaryReports"));
        let (runner, _receiver) = runner_against(&server, dao).await;

        // No sendMessage mock mounted: any reply would fail the handler.
        runner
            .handle_message(&message(100, 555, "good morning"))
            .await
            .expect("handled");
    }
}
