/// BroadcastDaoトレイト - 耐久ストア（購読者セット・配信済み台帳）の抽象化
use async_trait::async_trait;

use super::types::{AddOutcome, RecordOutcome, RemoveOutcome};

#[async_trait]
pub trait BroadcastDao: Send + Sync {
    // Subscriber store: a durable set of delivery targets, write-through on
    // every mutation.

    async fn add_subscriber(&self, chat_id: &str) -> anyhow::Result<AddOutcome>;

    async fn remove_subscriber(&self, chat_id: &str) -> anyhow::Result<RemoveOutcome>;

    /// Snapshot of the current subscriber set. Order is unspecified.
    async fn list_subscribers(&self) -> anyhow::Result<Vec<String>>;

    // Delivered-item ledger: append-only set of item ids whose fan-out has
    // been attempted. No eviction.

    async fn is_delivered(&self, item_id: &str) -> anyhow::Result<bool>;

    /// Safe to call more than once for the same id; the duplicate insert is
    /// reported as `AlreadyRecorded`, never as an error.
    async fn record_delivered(&self, item_id: &str) -> anyhow::Result<RecordOutcome>;
}
