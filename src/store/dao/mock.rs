// テスト用のインメモリBroadcastDao（DB接続なしで動作）
use std::collections::BTreeSet;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::dao_trait::BroadcastDao;
use super::types::{AddOutcome, RecordOutcome, RemoveOutcome};

pub(crate) struct MockBroadcastDao {
    subscribers: Mutex<BTreeSet<String>>,
    delivered: Mutex<BTreeSet<String>>,
    broadcast_channel: String,
}

impl MockBroadcastDao {
    pub(crate) fn new(broadcast_channel: &str) -> Self {
        let mut subscribers = BTreeSet::new();
        subscribers.insert(broadcast_channel.to_string());
        Self {
            subscribers: Mutex::new(subscribers),
            delivered: Mutex::new(BTreeSet::new()),
            broadcast_channel: broadcast_channel.to_string(),
        }
    }
}

#[async_trait]
impl BroadcastDao for MockBroadcastDao {
    async fn add_subscriber(&self, chat_id: &str) -> Result<AddOutcome> {
        let inserted = self
            .subscribers
            .lock()
            .expect("subscriber set lock")
            .insert(chat_id.to_string());
        Ok(if inserted {
            AddOutcome::Added
        } else {
            AddOutcome::AlreadyPresent
        })
    }

    async fn remove_subscriber(&self, chat_id: &str) -> Result<RemoveOutcome> {
        if chat_id == self.broadcast_channel {
            return Ok(RemoveOutcome::Protected);
        }
        let removed = self
            .subscribers
            .lock()
            .expect("subscriber set lock")
            .remove(chat_id);
        Ok(if removed {
            RemoveOutcome::Removed
        } else {
            RemoveOutcome::NotPresent
        })
    }

    async fn list_subscribers(&self) -> Result<Vec<String>> {
        Ok(self
            .subscribers
            .lock()
            .expect("subscriber set lock")
            .iter()
            .cloned()
            .collect())
    }

    async fn is_delivered(&self, item_id: &str) -> Result<bool> {
        Ok(self
            .delivered
            .lock()
            .expect("ledger lock")
            .contains(item_id))
    }

    async fn record_delivered(&self, item_id: &str) -> Result<RecordOutcome> {
        let inserted = self
            .delivered
            .lock()
            .expect("ledger lock")
            .insert(item_id.to_string());
        Ok(if inserted {
            RecordOutcome::Recorded
        } else {
            RecordOutcome::AlreadyRecorded
        })
    }
}
