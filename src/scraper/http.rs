use std::time::Duration;

use async_trait::async_trait;
use sea_orm::prelude::Decimal;

use crate::config::ScraperConfig;
use crate::error::{ AppError, Result };
use crate::models::{ Product, ProductListing };

use super::html::{ extract_page, PageData };
use super::url::{ normalize_product_url, sku_from_url, sku_url };
use super::{ PriceSource, ProductRef };

/// Fetches product pages over HTTP and reads name, price and seller from them.
pub struct HttpScraper {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    backoff: Duration,
}

impl HttpScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.shop_base_url.clone(),
            max_retries: config.max_retries.max(1),
            backoff: Duration::from_secs(1),
        })
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn resolve(&self, target: &ProductRef) -> Result<(String, String)> {
        match target {
            ProductRef::Url(raw) => {
                let url = normalize_product_url(&self.base_url, raw)?;
                let sku = sku_from_url(&url).unwrap_or_default();
                Ok((url, sku))
            }
            ProductRef::Sku(sku) => Ok((sku_url(&self.base_url, sku)?, sku.trim().to_string())),
        }
    }

    /// GET a page, backing off on 429 and 5xx responses. Retry `n` waits
    /// `2^n` backoff units; any other error status fails at once.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let mut last_err = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.backoff * (2u32).pow(attempt)).await;
            }

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(%url, attempt, error = %e, "product page request failed");
                    last_err = Some(AppError::from(e));
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                tracing::debug!(%url, attempt, %status, "product page temporarily unavailable");
                last_err = Some(AppError::Scrape(format!("{} returned {}", url, status)));
                continue;
            }
            if !status.is_success() {
                return Err(AppError::Scrape(format!("{} returned {}", url, status)));
            }

            return Ok(response.text().await?);
        }

        Err(last_err.unwrap_or_else(|| AppError::Scrape(format!("no attempts made for {}", url))))
    }

    async fn scrape(&self, url: &str) -> Result<(PageData, Decimal)> {
        let page = extract_page(&self.fetch_page(url).await?);
        let price = page.price.ok_or_else(|| {
            AppError::Scrape(format!("no price found on {}", url))
        })?;
        Ok((page, price))
    }
}

#[async_trait]
impl PriceSource for HttpScraper {
    async fn fetch_listing(&self, target: &ProductRef) -> Result<ProductListing> {
        let (url, sku) = self.resolve(target)?;
        let (page, price) = self.scrape(&url).await?;

        Ok(ProductListing {
            url,
            sku,
            name: page.name.unwrap_or_default(),
            seller: page.seller.unwrap_or_default(),
            price,
        })
    }

    async fn fetch_price(&self, product: &Product) -> Result<Decimal> {
        let (_, price) = self.scrape(&product.url).await?;
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    use super::*;

    const PAGE: &str = r#"<html><head><meta itemprop="price" content="2 490"></head>
        <body><h1>Toaster</h1></body></html>"#;

    fn config(max_retries: u32) -> ScraperConfig {
        ScraperConfig {
            shop_base_url: "https://www.ozon.ru".to_string(),
            user_agent: "test".to_string(),
            timeout: Duration::from_secs(1),
            max_retries,
            max_concurrent: 1,
        }
    }

    fn scraper() -> HttpScraper {
        HttpScraper::new(&config(1)).unwrap()
    }

    /// Serve `status` for the first `failures` requests, then the product page.
    async fn shop(status: StatusCode, failures: usize) -> (SocketAddr, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/product/toaster",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < failures {
                        (status, String::new())
                    } else {
                        (StatusCode::OK, PAGE.to_string())
                    }
                }
            })
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, hits)
    }

    fn product(addr: SocketAddr) -> Product {
        Product {
            id: uuid::Uuid::new_v4(),
            url: format!("http://{}/product/toaster", addr),
            sku: String::new(),
            name: "Toaster".to_string(),
            seller: String::new(),
            last_price: None,
            last_checked_at: None,
        }
    }

    #[tokio::test]
    async fn test_rate_limited_page_is_retried() {
        let (addr, hits) = shop(StatusCode::TOO_MANY_REQUESTS, 1).await;
        let scraper = HttpScraper::new(&config(3)).unwrap().with_backoff(Duration::from_millis(1));

        let price = scraper.fetch_price(&product(addr)).await.unwrap();

        assert_eq!(price, Decimal::new(2490, 0));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let (addr, hits) = shop(StatusCode::SERVICE_UNAVAILABLE, usize::MAX).await;
        let scraper = HttpScraper::new(&config(3)).unwrap().with_backoff(Duration::from_millis(1));

        let err = scraper.fetch_price(&product(addr)).await.unwrap_err();

        assert!(matches!(err, AppError::Scrape(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_fails_without_retry() {
        let (addr, hits) = shop(StatusCode::NOT_FOUND, usize::MAX).await;
        let scraper = HttpScraper::new(&config(3)).unwrap().with_backoff(Duration::from_millis(1));

        let err = scraper.fetch_price(&product(addr)).await.unwrap_err();

        assert!(matches!(err, AppError::Scrape(msg) if msg.contains("404")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolve_url_extracts_sku() {
        let (url, sku) = scraper()
            .resolve(&ProductRef::Url("www.ozon.ru/product/kettle-k1-778899/?from=share".into()))
            .unwrap();
        assert_eq!(url, "https://www.ozon.ru/product/kettle-k1-778899");
        assert_eq!(sku, "778899");
    }

    #[test]
    fn test_resolve_sku() {
        let (url, sku) = scraper().resolve(&ProductRef::Sku("778899".into())).unwrap();
        assert_eq!(url, "https://www.ozon.ru/product/778899");
        assert_eq!(sku, "778899");
    }

    #[test]
    fn test_resolve_rejects_foreign_url() {
        assert!(matches!(
            scraper().resolve(&ProductRef::Url("https://shop.example/product/1".into())),
            Err(AppError::InvalidInput(_))
        ));
    }
}
