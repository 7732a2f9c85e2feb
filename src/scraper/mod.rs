//! Price source seam and the HTTP product-page scraper behind it.

pub mod html;
pub mod http;
pub mod url;

use async_trait::async_trait;
use sea_orm::prelude::Decimal;

use crate::error::{ AppError, Result };
use crate::models::{ Product, ProductListing };

pub use http::HttpScraper;

/// How a user points at a product: a page URL or a bare SKU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductRef {
    Url(String),
    Sku(String),
}

impl ProductRef {
    /// Exactly one of `url` / `sku` must be given.
    pub fn from_parts(url: Option<String>, sku: Option<String>) -> Result<Self> {
        let url = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let sku = sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        match (url, sku) {
            (Some(url), None) => Ok(ProductRef::Url(url)),
            (None, Some(sku)) => Ok(ProductRef::Sku(sku)),
            (Some(_), Some(_)) => {
                Err(AppError::InvalidInput("give either product_url or product_sku, not both".to_string()))
            }
            (None, None) => {
                Err(AppError::InvalidInput("product_url or product_sku is required".to_string()))
            }
        }
    }

    /// Parse a chat argument: anything with a slash or dot is a URL.
    pub fn parse(arg: &str) -> Result<Self> {
        let arg = arg.trim();
        if arg.contains('/') || arg.contains('.') {
            Self::from_parts(Some(arg.to_string()), None)
        } else {
            Self::from_parts(None, Some(arg.to_string()))
        }
    }
}

/// Where prices come from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Resolve and scrape a product the user wants to start tracking.
    async fn fetch_listing(&self, target: &ProductRef) -> Result<ProductListing>;

    /// Current price of an already stored product.
    async fn fetch_price(&self, product: &Product) -> Result<Decimal>;
}
