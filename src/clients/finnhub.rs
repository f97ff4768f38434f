/// Finnhub一般ニュースの取得クライアント。
///
/// `GET /api/v1/news?category=general` の薄いラッパー。タイムアウトは
/// クライアント構築時に固定される。
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

/// Finnhubから取得した記事。
///
/// フィードは記事ごとに安定したidを割り当てる。同一記事は再ポーリングでも
/// 同じidで現れる（重複排除の前提）。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinnhubArticle {
    pub id: i64,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
}

/// Finnhubクライアントの設定。
#[derive(Debug, Clone)]
pub struct FinnhubConfig {
    pub base_url: String,
    pub api_token: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
}

/// Finnhubとの通信を管理するクライアント。
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    client: Client,
    base_url: Url,
    api_token: String,
}

impl FinnhubClient {
    /// 新しいFinnhubクライアントを作成する。
    ///
    /// # Errors
    /// URLのパースまたはHTTPクライアントの構築に失敗した場合はエラーを返す。
    pub fn new(config: FinnhubConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build finnhub HTTP client")?;

        let base_url = Url::parse(&config.base_url).context("invalid finnhub base URL")?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token,
        })
    }

    /// カテゴリ`general`のニュース一覧を取得する（新しい順）。
    ///
    /// # Errors
    /// HTTPリクエストまたはレスポンスのデコードに失敗した場合はエラーを返す。
    pub async fn general_news(&self) -> Result<Vec<FinnhubArticle>> {
        let mut url = self
            .base_url
            .join("api/v1/news")
            .context("failed to build news URL")?;

        url.query_pairs_mut()
            .append_pair("category", "general")
            .append_pair("token", &self.api_token);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("finnhub news request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("finnhub returned error status {status}: {error_body}");
        }

        let articles = response
            .json::<Vec<FinnhubArticle>>()
            .await
            .context("failed to decode finnhub news response")?;

        debug!(count = articles.len(), "fetched finnhub general news");
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> FinnhubClient {
        FinnhubClient::new(FinnhubConfig {
            base_url: server.uri(),
            api_token: "test-token".to_string(),
            connect_timeout: Duration::from_secs(1),
            total_timeout: Duration::from_secs(2),
        })
        .expect("client builds")
    }

    #[tokio::test]
    async fn general_news_decodes_articles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/news"))
            .and(query_param("category", "general"))
            .and(query_param("token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 7_423_198,
                    "category": "top news",
                    "headline": "Fed raises rates",
                    "summary": "The central bank moved again.",
                    "url": "https://example.com/fed"
                },
                {
                    "id": 7_423_199,
                    "headline": "Markets rally",
                    "summary": "",
                    "url": "https://example.com/rally"
                }
            ])))
            .mount(&server)
            .await;

        let articles = client_for(&server)
            .general_news()
            .await
            .expect("fetch succeeds");

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, 7_423_198);
        assert_eq!(articles[0].headline, "Fed raises rates");
        assert_eq!(articles[1].summary, "");
    }

    #[tokio::test]
    async fn general_news_surfaces_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/news"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .general_news()
            .await
            .expect_err("fetch should fail");

        assert!(error.to_string().contains("401"));
    }
}
