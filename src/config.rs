use std::env;
use std::time::Duration;

use sea_orm::prelude::Decimal;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Scraper settings resolved from environment variables.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub shop_base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub max_concurrent: usize,
}

impl ScraperConfig {
    /// Upper bound for one product fetch including every retry and its backoff.
    pub fn fetch_budget(&self) -> Duration {
        let attempts = self.max_retries.max(1);
        let backoff: u64 = (1..attempts).map(|a| (2u64).pow(a)).sum();
        self.timeout * attempts + Duration::from_secs(backoff)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub telegram_bot_token: String,
    pub server_host: String,
    pub server_port: u16,
    pub poll_interval: Duration,
    pub scraper: ScraperConfig,
    pub default_threshold_ratio: Decimal,
    pub notification_max_attempts: u32,
    pub notification_batch_size: u64,
    pub notification_flush_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
        where F: Fn(&str) -> Option<String>
    {
        let required = |key: &str| lookup(key).ok_or_else(|| format!("{} must be set", key));
        let or_default = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let database_url = required("DATABASE_URL")?;
        let telegram_bot_token = required("TELEGRAM_BOT_TOKEN")?;

        let server_host = or_default("SERVER_HOST", "0.0.0.0");
        let server_port = or_default("SERVER_PORT", "12345").parse()?;

        let poll_interval_secs: u64 = or_default("POLL_INTERVAL_SECS", "86400").parse()?;
        if poll_interval_secs == 0 {
            return Err("POLL_INTERVAL_SECS must be greater than zero".into());
        }

        let scrape_timeout_secs: u64 = or_default("SCRAPE_TIMEOUT_SECS", "30").parse()?;
        if scrape_timeout_secs == 0 {
            return Err("SCRAPE_TIMEOUT_SECS must be greater than zero".into());
        }

        let max_concurrent: usize = or_default("MAX_CONCURRENT_SCRAPES", "4").parse()?;
        if max_concurrent == 0 {
            return Err("MAX_CONCURRENT_SCRAPES must be at least 1".into());
        }

        let shop_base_url = or_default("SHOP_BASE_URL", "https://www.ozon.ru")
            .trim_end_matches('/')
            .to_string();

        let scraper = ScraperConfig {
            shop_base_url,
            user_agent: or_default("SCRAPER_USER_AGENT", DEFAULT_USER_AGENT),
            timeout: Duration::from_secs(scrape_timeout_secs),
            max_retries: or_default("SCRAPE_RETRIES", "3").parse()?,
            max_concurrent,
        };

        let default_threshold_ratio: Decimal = or_default("DEFAULT_THRESHOLD_RATIO", "0.9").parse()?;
        if default_threshold_ratio <= Decimal::ZERO || default_threshold_ratio > Decimal::ONE {
            return Err("DEFAULT_THRESHOLD_RATIO must be in (0, 1]".into());
        }

        let flush_secs: u64 = or_default("NOTIFICATION_FLUSH_SECS", "60").parse()?;
        if flush_secs == 0 {
            return Err("NOTIFICATION_FLUSH_SECS must be greater than zero".into());
        }

        Ok(Config {
            database_url,
            telegram_bot_token,
            server_host,
            server_port,
            poll_interval: Duration::from_secs(poll_interval_secs),
            scraper,
            default_threshold_ratio,
            notification_max_attempts: or_default("NOTIFICATION_MAX_ATTEMPTS", "10").parse()?,
            notification_batch_size: or_default("NOTIFICATION_BATCH_SIZE", "100").parse()?,
            notification_flush_interval: Duration::from_secs(flush_secs),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/prices"),
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:12345");
        assert_eq!(config.poll_interval, Duration::from_secs(86400));
        assert_eq!(config.scraper.timeout, Duration::from_secs(30));
        assert_eq!(config.scraper.shop_base_url, "https://www.ozon.ru");
        assert_eq!(config.default_threshold_ratio, Decimal::new(9, 1));
        assert_eq!(config.notification_max_attempts, 10);
        assert_eq!(config.notification_flush_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_flush_interval_override() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("NOTIFICATION_FLUSH_SECS", "15"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.notification_flush_interval, Duration::from_secs(15));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("NOTIFICATION_FLUSH_SECS", "0"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_fetch_budget_covers_retries() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        // three 30s attempts plus 2s and 4s of backoff
        assert_eq!(config.scraper.fetch_budget(), Duration::from_secs(96));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = Config::from_lookup(lookup(&REQUIRED[..1])).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_rejects_zero_timeout_and_bad_ratio() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SCRAPE_TIMEOUT_SECS", "0"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DEFAULT_THRESHOLD_RATIO", "1.5"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_trailing_slash_is_trimmed_from_shop_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SHOP_BASE_URL", "http://localhost:8081/"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.scraper.shop_base_url, "http://localhost:8081");
    }
}
