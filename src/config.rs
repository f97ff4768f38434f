use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// 原実装のキーワード語彙。`BROADCAST_KEYWORDS` で上書き可能。
const DEFAULT_KEYWORDS: &str = "stock,market,trading,finance,economy,fed,wall street,nasdaq,dow,\
crypto,bitcoin,geopolitical,gaza,israel,cramer,jpmorgan,chase,bank of america,blackrock,vanguard,\
trump,china,usa,treasury,war,mastercard,visa,binance,bitget,kucoin,s&p,nvidia,amd,microsoft,us,\
gold,xau,elon musk,tesla,solana,bnb,michael saylor,robinhood,etf,openai,ethereum,amazon,tether,\
coinbase,white house,powell,polymarket,bybit,cpi,ppi,fomc,nfp,inflation,rate cut,housing,\
blockchain,interest rate";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    telegram_bot_token: String,
    telegram_base_url: String,
    telegram_connect_timeout: Duration,
    telegram_total_timeout: Duration,
    telegram_poll_timeout_secs: u64,
    finnhub_api_token: String,
    finnhub_base_url: String,
    finnhub_connect_timeout: Duration,
    finnhub_total_timeout: Duration,
    broadcast_db_dsn: String,
    broadcast_interval: Duration,
    broadcast_channel: String,
    fetch_limit: usize,
    keywords: Vec<String>,
    admin_ids: Vec<String>,
    db_max_connections: u32,
    db_acquire_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数からブロードキャストワーカーの設定値を読み込み、検証する。
    ///
    /// キーワード語彙は読み込み時に小文字へ正規化される（フィルタは小文字部分
    /// 一致で動作するため）。
    ///
    /// # Errors
    /// `TELEGRAM_BOT_TOKEN` もしくは `FINNHUB_API_TOKEN` が未設定、または各種値の
    /// パースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram_bot_token = env_var("TELEGRAM_BOT_TOKEN")?;
        let finnhub_api_token = env_var("FINNHUB_API_TOKEN")?;
        let http_bind = parse_socket_addr("CANARY_HTTP_BIND", "0.0.0.0:9010")?;
        let broadcast_db_dsn = env::var("BROADCAST_DB_DSN")
            .unwrap_or_else(|_| "sqlite://canary.db?mode=rwc".to_string());

        let telegram_base_url = env::var("TELEGRAM_BASE_URL")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());
        let finnhub_base_url =
            env::var("FINNHUB_BASE_URL").unwrap_or_else(|_| "https://finnhub.io/".to_string());

        // HTTP timeout settings; the Telegram total timeout must exceed the
        // getUpdates long-poll window.
        let telegram_connect_timeout = parse_duration_ms("TELEGRAM_CONNECT_TIMEOUT_MS", 3000)?;
        let telegram_total_timeout = parse_duration_ms("TELEGRAM_TOTAL_TIMEOUT_MS", 40_000)?;
        let telegram_poll_timeout_secs = parse_u64("TELEGRAM_POLL_TIMEOUT_SECS", 30)?;
        let finnhub_connect_timeout = parse_duration_ms("FINNHUB_CONNECT_TIMEOUT_MS", 3000)?;
        let finnhub_total_timeout = parse_duration_ms("FINNHUB_TOTAL_TIMEOUT_MS", 30_000)?;

        // Broadcast pipeline settings
        let broadcast_interval = parse_duration_secs("BROADCAST_INTERVAL_SECS", 30)?;
        let broadcast_channel =
            env::var("BROADCAST_CHANNEL").unwrap_or_else(|_| "@CanaryReports".to_string());
        let fetch_limit = parse_usize("FETCH_LIMIT", 10)?;
        let keywords = parse_csv("BROADCAST_KEYWORDS", DEFAULT_KEYWORDS)
            .into_iter()
            .map(|keyword| keyword.to_lowercase())
            .collect();
        let admin_ids = parse_csv("ADMIN_IDS", "");

        // Database connection pool settings
        let db_max_connections = parse_u32("BROADCAST_DB_MAX_CONNECTIONS", 5)?;
        let db_acquire_timeout = parse_duration_secs("BROADCAST_DB_ACQUIRE_TIMEOUT_SECS", 30)?;

        Ok(Self {
            http_bind,
            telegram_bot_token,
            telegram_base_url,
            telegram_connect_timeout,
            telegram_total_timeout,
            telegram_poll_timeout_secs,
            finnhub_api_token,
            finnhub_base_url,
            finnhub_connect_timeout,
            finnhub_total_timeout,
            broadcast_db_dsn,
            broadcast_interval,
            broadcast_channel,
            fetch_limit,
            keywords,
            admin_ids,
            db_max_connections,
            db_acquire_timeout,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn telegram_bot_token(&self) -> &str {
        &self.telegram_bot_token
    }

    #[must_use]
    pub fn telegram_base_url(&self) -> &str {
        &self.telegram_base_url
    }

    #[must_use]
    pub fn telegram_connect_timeout(&self) -> Duration {
        self.telegram_connect_timeout
    }

    #[must_use]
    pub fn telegram_total_timeout(&self) -> Duration {
        self.telegram_total_timeout
    }

    #[must_use]
    pub fn telegram_poll_timeout_secs(&self) -> u64 {
        self.telegram_poll_timeout_secs
    }

    #[must_use]
    pub fn finnhub_api_token(&self) -> &str {
        &self.finnhub_api_token
    }

    #[must_use]
    pub fn finnhub_base_url(&self) -> &str {
        &self.finnhub_base_url
    }

    #[must_use]
    pub fn finnhub_connect_timeout(&self) -> Duration {
        self.finnhub_connect_timeout
    }

    #[must_use]
    pub fn finnhub_total_timeout(&self) -> Duration {
        self.finnhub_total_timeout
    }

    #[must_use]
    pub fn broadcast_db_dsn(&self) -> &str {
        &self.broadcast_db_dsn
    }

    #[must_use]
    pub fn broadcast_interval(&self) -> Duration {
        self.broadcast_interval
    }

    #[must_use]
    pub fn broadcast_channel(&self) -> &str {
        &self.broadcast_channel
    }

    #[must_use]
    pub fn fetch_limit(&self) -> usize {
        self.fetch_limit
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn admin_ids(&self) -> &[String] {
        &self.admin_ids
    }

    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    #[must_use]
    pub fn db_acquire_timeout(&self) -> Duration {
        self.db_acquire_timeout
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<SocketAddr>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_duration_ms(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    Ok(Duration::from_millis(parse_u64(name, default)?))
}

fn parse_duration_secs(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    Ok(Duration::from_secs(parse_u64(name, default)?))
}

fn parse_csv(name: &'static str, default: &str) -> Vec<String> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_env(name: &str, value: &str) {
        // SAFETY: tests run sequentially and assign valid UTF-8 values.
        unsafe {
            env::set_var(name, value);
        }
    }

    fn remove_env(name: &str) {
        // SAFETY: tests run sequentially and clean up deterministic keys.
        unsafe {
            env::remove_var(name);
        }
    }

    fn reset_env() {
        remove_env("TELEGRAM_BOT_TOKEN");
        remove_env("TELEGRAM_BASE_URL");
        remove_env("TELEGRAM_CONNECT_TIMEOUT_MS");
        remove_env("TELEGRAM_TOTAL_TIMEOUT_MS");
        remove_env("TELEGRAM_POLL_TIMEOUT_SECS");
        remove_env("FINNHUB_API_TOKEN");
        remove_env("FINNHUB_BASE_URL");
        remove_env("FINNHUB_CONNECT_TIMEOUT_MS");
        remove_env("FINNHUB_TOTAL_TIMEOUT_MS");
        remove_env("CANARY_HTTP_BIND");
        remove_env("BROADCAST_DB_DSN");
        remove_env("BROADCAST_INTERVAL_SECS");
        remove_env("BROADCAST_CHANNEL");
        remove_env("FETCH_LIMIT");
        remove_env("BROADCAST_KEYWORDS");
        remove_env("ADMIN_IDS");
        remove_env("BROADCAST_DB_MAX_CONNECTIONS");
        remove_env("BROADCAST_DB_ACQUIRE_TIMEOUT_SECS");
    }

    #[test]
    fn from_env_uses_defaults_when_optional_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("TELEGRAM_BOT_TOKEN", "123:abc");
        set_env("FINNHUB_API_TOKEN", "fh-token");

        let config = Config::from_env().expect("config should load");

        assert_eq!(config.telegram_bot_token(), "123:abc");
        assert_eq!(config.finnhub_api_token(), "fh-token");
        assert_eq!(config.http_bind(), "0.0.0.0:9010".parse().unwrap());
        assert_eq!(config.broadcast_db_dsn(), "sqlite://canary.db?mode=rwc");
        assert_eq!(config.telegram_base_url(), "https://api.telegram.org");
        assert_eq!(config.finnhub_base_url(), "https://finnhub.io/");
        assert_eq!(config.broadcast_interval(), Duration::from_secs(30));
        assert_eq!(config.broadcast_channel(), "@CanaryReports");
        assert_eq!(config.fetch_limit(), 10);
        assert_eq!(config.telegram_poll_timeout_secs(), 30);
        assert_eq!(config.telegram_total_timeout(), Duration::from_millis(40_000));
        assert!(config.admin_ids().is_empty());
        assert!(config.keywords().contains(&"wall street".to_string()));
        assert!(config.keywords().contains(&"interest rate".to_string()));
        assert_eq!(config.db_max_connections(), 5);
    }

    #[test]
    fn from_env_overrides_values() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("TELEGRAM_BOT_TOKEN", "123:abc");
        set_env("FINNHUB_API_TOKEN", "fh-token");
        set_env("CANARY_HTTP_BIND", "127.0.0.1:8088");
        set_env("BROADCAST_DB_DSN", "sqlite:///var/lib/canary/news.db");
        set_env("BROADCAST_INTERVAL_SECS", "120");
        set_env("BROADCAST_CHANNEL", "@OtherChannel");
        set_env("FETCH_LIMIT", "25");
        set_env("BROADCAST_KEYWORDS", "Gold, OIL ,uranium");
        set_env("ADMIN_IDS", "111,222");

        let config = Config::from_env().expect("config should load");

        assert_eq!(config.http_bind(), "127.0.0.1:8088".parse().unwrap());
        assert_eq!(config.broadcast_db_dsn(), "sqlite:///var/lib/canary/news.db");
        assert_eq!(config.broadcast_interval(), Duration::from_secs(120));
        assert_eq!(config.broadcast_channel(), "@OtherChannel");
        assert_eq!(config.fetch_limit(), 25);
        assert_eq!(config.keywords(), &["gold", "oil", "uranium"]);
        assert_eq!(config.admin_ids(), &["111", "222"]);
    }

    #[test]
    fn from_env_errors_when_bot_token_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("FINNHUB_API_TOKEN", "fh-token");

        let error = Config::from_env().expect_err("missing bot token should fail");

        assert!(matches!(error, ConfigError::Missing("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn from_env_errors_when_feed_token_missing() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("TELEGRAM_BOT_TOKEN", "123:abc");

        let error = Config::from_env().expect_err("missing feed token should fail");

        assert!(matches!(error, ConfigError::Missing("FINNHUB_API_TOKEN")));
    }

    #[test]
    fn from_env_errors_on_invalid_interval() {
        let _lock = ENV_MUTEX.lock().expect("env mutex");
        reset_env();
        set_env("TELEGRAM_BOT_TOKEN", "123:abc");
        set_env("FINNHUB_API_TOKEN", "fh-token");
        set_env("BROADCAST_INTERVAL_SECS", "soon");

        let error = Config::from_env().expect_err("invalid interval should fail");

        assert!(matches!(
            error,
            ConfigError::Invalid {
                name: "BROADCAST_INTERVAL_SECS",
                ..
            }
        ));
    }
}
