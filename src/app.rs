use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use reqwest::Client;
use sqlx::sqlite::SqlitePoolOptions;

use crate::{
    api,
    bot::{AuthorizationPolicy, BotRunner},
    clients::{FinnhubClient, FinnhubConfig, TelegramClient},
    config::Config,
    observability::Telemetry,
    pipeline::{BroadcastPipeline, FinnhubFetchStage, RelevanceFilter, TelegramNotifier},
    scheduler::{Scheduler, spawn_worker},
    store::dao::BroadcastDaoImpl,
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    scheduler: Scheduler,
    telegram_client: Arc<TelegramClient>,
    dao: Arc<BroadcastDaoImpl>,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.registry.scheduler
    }

    pub(crate) fn dao(&self) -> Arc<BroadcastDaoImpl> {
        Arc::clone(&self.registry.dao)
    }
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、アプリケーションの共有レジストリを構築する。
    ///
    /// 単一フライトのブロードキャストワーカーはここで起動する。タイマーとボットの
    /// コマンドループは呼び出し側が [`ComponentRegistry::scheduler`] と
    /// [`ComponentRegistry::bot_runner`] から起動する。
    ///
    /// # Errors
    /// Telemetry の初期化、HTTP クライアント構築、またはストアのマイグレーションが
    /// 失敗した場合はエラーを返す。
    pub async fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.db_max_connections())
            .acquire_timeout(config.db_acquire_timeout())
            .connect(config.broadcast_db_dsn())
            .await
            .context("failed to open broadcast_db connection pool")?;
        let dao = Arc::new(BroadcastDaoImpl::new(pool, config.broadcast_channel()));
        dao.migrate().await?;

        let telegram_http = Client::builder()
            .connect_timeout(config.telegram_connect_timeout())
            .timeout(config.telegram_total_timeout())
            .build()
            .context("failed to build telegram HTTP client")?;
        let telegram_client = Arc::new(TelegramClient::new(
            telegram_http,
            config.telegram_base_url(),
            config.telegram_bot_token(),
        ));
        let finnhub_client = Arc::new(FinnhubClient::new(FinnhubConfig {
            base_url: config.finnhub_base_url().to_string(),
            api_token: config.finnhub_api_token().to_string(),
            connect_timeout: config.finnhub_connect_timeout(),
            total_timeout: config.finnhub_total_timeout(),
        })?);

        let pipeline = Arc::new(BroadcastPipeline::new(
            Arc::new(FinnhubFetchStage::new(Arc::clone(&finnhub_client))),
            RelevanceFilter::new(config.keywords().to_vec()),
            Arc::new(TelegramNotifier::new(
                Arc::clone(&telegram_client),
                config.broadcast_channel(),
            )),
            Arc::clone(&dao) as _,
            telemetry.metrics_arc(),
            config.fetch_limit(),
        ));
        let (scheduler, _worker) = spawn_worker(pipeline);

        Ok(Self {
            config,
            telemetry,
            scheduler,
            telegram_client,
            dao,
        })
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// コマンド面のランナーを組み立てる。起動は呼び出し側の責務。
    #[must_use]
    pub fn bot_runner(&self) -> BotRunner {
        BotRunner::new(
            Arc::clone(&self.telegram_client),
            Arc::clone(&self.dao) as _,
            self.scheduler.clone(),
            AuthorizationPolicy::new(self.config.admin_ids().to_vec()),
            self.config.telegram_poll_timeout_secs(),
        )
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}
