use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::finnhub::FinnhubClient;

/// 1回のポーリングで取得した候補記事。ポーリングごとに作り直され、永続化は
/// 配信後のidのみ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub item_id: String,
    pub headline: String,
    pub summary: String,
    pub source_url: String,
}

/// Fetch Client interface: one call per broadcast run, feed order preserved.
#[async_trait]
pub trait FetchStage: Send + Sync {
    /// Fetch at most `limit` candidate items, most recent first.
    async fn fetch(&self, limit: usize) -> anyhow::Result<Vec<NewsItem>>;
}

/// Finnhubの一般ニュースを候補として返すステージ。
pub struct FinnhubFetchStage {
    client: Arc<FinnhubClient>,
}

impl FinnhubFetchStage {
    #[must_use]
    pub fn new(client: Arc<FinnhubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchStage for FinnhubFetchStage {
    async fn fetch(&self, limit: usize) -> anyhow::Result<Vec<NewsItem>> {
        let mut articles = self.client.general_news().await?;
        articles.truncate(limit);

        Ok(articles
            .into_iter()
            .map(|article| NewsItem {
                item_id: article.id.to_string(),
                headline: article.headline,
                summary: article.summary,
                source_url: article.url,
            })
            .collect())
    }
}
