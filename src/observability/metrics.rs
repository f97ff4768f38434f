/// Prometheusメトリクス定義。
use prometheus::{
    Counter, Gauge, Histogram, Registry, register_counter_with_registry,
    register_gauge_with_registry, register_histogram_with_registry,
};

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub runs_completed: Counter,
    pub runs_failed: Counter,
    pub items_fetched: Counter,
    pub items_delivered: Counter,
    pub messages_sent: Counter,
    pub delivery_failures: Counter,

    // ヒストグラム
    pub run_duration: Histogram,

    // ゲージ
    pub subscribers: Gauge,
}

impl Metrics {
    /// 新しいメトリクスコレクターを作成する。
    ///
    /// # Errors
    /// メトリクスの登録に失敗した場合はエラーを返す。
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            runs_completed: register_counter_with_registry!(
                "canary_runs_completed_total",
                "Total number of broadcast runs completed",
                registry
            )?,
            runs_failed: register_counter_with_registry!(
                "canary_runs_failed_total",
                "Total number of broadcast runs that aborted with an error",
                registry
            )?,
            items_fetched: register_counter_with_registry!(
                "canary_items_fetched_total",
                "Total number of feed items fetched",
                registry
            )?,
            items_delivered: register_counter_with_registry!(
                "canary_items_delivered_total",
                "Total number of items recorded in the delivered ledger",
                registry
            )?,
            messages_sent: register_counter_with_registry!(
                "canary_messages_sent_total",
                "Total number of per-target messages sent",
                registry
            )?,
            delivery_failures: register_counter_with_registry!(
                "canary_delivery_failures_total",
                "Total number of per-target delivery failures",
                registry
            )?,
            run_duration: register_histogram_with_registry!(
                "canary_run_duration_seconds",
                "Duration of one broadcast run",
                registry
            )?,
            subscribers: register_gauge_with_registry!(
                "canary_subscribers",
                "Size of the subscriber set at the last snapshot",
                registry
            )?,
        })
    }
}
