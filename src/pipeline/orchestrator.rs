use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::broadcast::Notifier;
use super::fetch::FetchStage;
use super::filter::RelevanceFilter;
use crate::observability::Metrics;
use crate::scheduler::RunContext;
use crate::store::dao::BroadcastDao;

/// 1回のブロードキャスト実行の集計。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Candidate items returned by the fetch stage.
    pub items_considered: usize,
    /// Items that passed filter+dedup and were recorded in the ledger.
    pub items_delivered: usize,
    /// Per-target messages delivered successfully.
    pub messages_sent: usize,
    /// Per-target delivery failures (contained, never abort a run).
    pub delivery_failures: usize,
}

/// ブロードキャストパイプライン本体。
///
/// fetch → filter → dedup-check → fan-out → ledger commit を候補ごとに
/// フィード順で実行する。同時実行はスケジューラ側の単一フライト保証に依存する。
pub struct BroadcastPipeline {
    fetch: Arc<dyn FetchStage>,
    filter: RelevanceFilter,
    notifier: Arc<dyn Notifier>,
    dao: Arc<dyn BroadcastDao>,
    metrics: Arc<Metrics>,
    fetch_limit: usize,
}

impl BroadcastPipeline {
    #[must_use]
    pub fn new(
        fetch: Arc<dyn FetchStage>,
        filter: RelevanceFilter,
        notifier: Arc<dyn Notifier>,
        dao: Arc<dyn BroadcastDao>,
        metrics: Arc<Metrics>,
        fetch_limit: usize,
    ) -> Self {
        Self {
            fetch,
            filter,
            notifier,
            dao,
            metrics,
            fetch_limit,
        }
    }

    /// One full poll-and-broadcast pass.
    ///
    /// # Errors
    /// Fetch or storage failures abort the run; the caller logs them and the
    /// next trigger retries naturally. Per-target delivery failures do not
    /// surface here, only in the report.
    pub async fn run_once(&self, run: &RunContext) -> Result<PipelineReport> {
        let started = Instant::now();
        let result = self.execute(run).await;
        self.metrics.run_duration.observe(started.elapsed().as_secs_f64());
        match &result {
            Ok(_) => self.metrics.runs_completed.inc(),
            Err(_) => self.metrics.runs_failed.inc(),
        }
        result
    }

    async fn execute(&self, run: &RunContext) -> Result<PipelineReport> {
        // A fetch failure aborts the whole run before any ledger write.
        let items = self
            .fetch
            .fetch(self.fetch_limit)
            .await
            .context("news feed fetch failed")?;

        #[allow(clippy::cast_precision_loss)]
        self.metrics.items_fetched.inc_by(items.len() as f64);

        let mut report = PipelineReport {
            items_considered: items.len(),
            ..PipelineReport::default()
        };

        info!(
            run_id = %run.run_id,
            candidates = items.len(),
            "fetching news completed, starting broadcast pass"
        );

        for item in &items {
            if !self.filter.is_relevant(&item.headline, &item.summary) {
                continue;
            }

            if self
                .dao
                .is_delivered(&item.item_id)
                .await
                .context("failed to query delivered ledger")?
            {
                debug!(run_id = %run.run_id, item_id = %item.item_id, "item already delivered, skipping");
                continue;
            }

            // Snapshot once per item, not once per run: subscribers added
            // mid-run still receive the items processed after they land.
            let targets = self
                .dao
                .list_subscribers()
                .await
                .context("failed to snapshot subscribers")?;

            #[allow(clippy::cast_precision_loss)]
            self.metrics.subscribers.set(targets.len() as f64);

            let mut failures = 0usize;
            for chat_id in &targets {
                match self.notifier.send(chat_id, item).await {
                    Ok(()) => {
                        report.messages_sent += 1;
                        self.metrics.messages_sent.inc();
                    }
                    Err(error) => {
                        failures += 1;
                        self.metrics.delivery_failures.inc();
                        warn!(
                            run_id = %run.run_id,
                            item_id = %item.item_id,
                            chat_id = %chat_id,
                            error = format!("{error:#}"),
                            "delivery failed, continuing fan-out"
                        );
                    }
                }
            }

            // Recorded after the fan-out attempt regardless of per-target
            // failures: an item gets exactly one fan-out pass and is never
            // retried, even when every send failed.
            self.dao
                .record_delivered(&item.item_id)
                .await
                .context("failed to record delivered item")?;
            self.metrics.items_delivered.inc();

            report.items_delivered += 1;
            report.delivery_failures += failures;

            info!(
                run_id = %run.run_id,
                item_id = %item.item_id,
                targets = targets.len(),
                failures,
                "item broadcast"
            );
        }

        Ok(report)
    }
}
