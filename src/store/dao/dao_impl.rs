/// SQLite実装のBroadcastDao。
///
/// 単一の長寿命コネクションプールを共有する。呼び出しごとのハンドル再オープンは
/// 行わない。書き込みはSQLite側で直列化される。
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;

use super::dao_trait::BroadcastDao;
use super::types::{AddOutcome, RecordOutcome, RemoveOutcome};

pub struct BroadcastDaoImpl {
    pool: SqlitePool,
    broadcast_channel: String,
}

impl BroadcastDaoImpl {
    #[must_use]
    pub fn new(pool: SqlitePool, broadcast_channel: impl Into<String>) -> Self {
        Self {
            pool,
            broadcast_channel: broadcast_channel.into(),
        }
    }

    /// Create the two durable sets and seed the permanent broadcast channel.
    ///
    /// Idempotent; safe to run on every startup.
    ///
    /// # Errors
    /// Returns an error when schema creation or the seed insert fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS subscribers (chat_id TEXT PRIMARY KEY)")
            .execute(&self.pool)
            .await
            .context("failed to create subscribers table")?;

        sqlx::query("CREATE TABLE IF NOT EXISTS posted_articles (article_id TEXT PRIMARY KEY)")
            .execute(&self.pool)
            .await
            .context("failed to create posted_articles table")?;

        sqlx::query("INSERT OR IGNORE INTO subscribers (chat_id) VALUES (?1)")
            .bind(&self.broadcast_channel)
            .execute(&self.pool)
            .await
            .context("failed to seed broadcast channel")?;

        Ok(())
    }

    /// Cheap connectivity probe for the readiness endpoint.
    ///
    /// # Errors
    /// Returns an error when the pool cannot serve a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("broadcast database ping failed")?;
        Ok(())
    }
}

#[async_trait]
impl BroadcastDao for BroadcastDaoImpl {
    async fn add_subscriber(&self, chat_id: &str) -> Result<AddOutcome> {
        let result = sqlx::query("INSERT OR IGNORE INTO subscribers (chat_id) VALUES (?1)")
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .context("failed to insert subscriber")?;

        if result.rows_affected() > 0 {
            Ok(AddOutcome::Added)
        } else {
            Ok(AddOutcome::AlreadyPresent)
        }
    }

    async fn remove_subscriber(&self, chat_id: &str) -> Result<RemoveOutcome> {
        // The seeded channel is a permanent target; removal is rejected
        // deterministically rather than silently ignored.
        if chat_id == self.broadcast_channel {
            return Ok(RemoveOutcome::Protected);
        }

        let result = sqlx::query("DELETE FROM subscribers WHERE chat_id = ?1")
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .context("failed to delete subscriber")?;

        if result.rows_affected() > 0 {
            Ok(RemoveOutcome::Removed)
        } else {
            Ok(RemoveOutcome::NotPresent)
        }
    }

    async fn list_subscribers(&self) -> Result<Vec<String>> {
        let chat_ids = sqlx::query_scalar::<_, String>("SELECT chat_id FROM subscribers")
            .fetch_all(&self.pool)
            .await
            .context("failed to list subscribers")?;
        Ok(chat_ids)
    }

    async fn is_delivered(&self, item_id: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM posted_articles WHERE article_id = ?1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to query delivered ledger")?;
        Ok(found.is_some())
    }

    async fn record_delivered(&self, item_id: &str) -> Result<RecordOutcome> {
        let result = sqlx::query("INSERT OR IGNORE INTO posted_articles (article_id) VALUES (?1)")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .context("failed to record delivered item")?;

        if result.rows_affected() > 0 {
            Ok(RecordOutcome::Recorded)
        } else {
            Ok(RecordOutcome::AlreadyRecorded)
        }
    }
}
