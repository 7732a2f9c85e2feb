use chrono::{ DateTime, Utc };
use sea_orm::prelude::Decimal;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use crate::enums::{ AlertState, DeliveryStatus };
use crate::error::{ AppError, Result };

/// Telegram user that receives notifications. The chat id is the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: i64,
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub url: String,
    pub sku: String,
    pub name: String,
    pub seller: String,
    pub last_price: Option<Decimal>,
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// What the scraper knows about a listing before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductListing {
    pub url: String,
    pub sku: String,
    pub name: String,
    pub seller: String,
    pub price: Decimal,
}

/// A subscriber's threshold on one product, plus its detection state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedItem {
    pub id: Uuid,
    pub subscriber_id: i64,
    pub product_id: Uuid,
    pub threshold: Decimal,
    pub state: AlertState,
    pub last_price: Option<Decimal>,
    pub last_observed_at: Option<DateTime<Utc>>,
    pub notified_at: Option<DateTime<Utc>>,
}

impl TrackedItem {
    pub fn new(subscriber_id: i64, product_id: Uuid, threshold: Decimal) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            subscriber_id,
            product_id,
            threshold: validate_threshold(threshold)?,
            state: AlertState::AboveThreshold,
            last_price: None,
            last_observed_at: None,
            notified_at: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub product_id: Uuid,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl PriceObservation {
    pub fn now(product_id: Uuid, price: Decimal) -> Self {
        Self { product_id, price, observed_at: Utc::now() }
    }
}

/// Outbox entry created when an item first crosses below its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub tracked_item_id: Uuid,
    pub subscriber_id: i64,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_url: String,
    pub seller: String,
    pub price: Decimal,
    pub threshold: Decimal,
    pub observed_at: DateTime<Utc>,
    pub status: DeliveryStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl NotificationEvent {
    pub fn for_crossing(item: &TrackedItem, product: &Product, observation: &PriceObservation) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracked_item_id: item.id,
            subscriber_id: item.subscriber_id,
            product_id: product.id,
            product_name: product.name.clone(),
            product_url: product.url.clone(),
            seller: product.seller.clone(),
            price: observation.price,
            threshold: item.threshold,
            observed_at: observation.observed_at,
            status: DeliveryStatus::Pending,
            attempts: 0,
            last_error: None,
        }
    }
}

/// Thresholds are positive money amounts with at most two decimal places.
pub fn validate_threshold(threshold: Decimal) -> Result<Decimal> {
    let rounded = threshold.round_dp(2).normalize();
    if rounded <= Decimal::ZERO {
        return Err(AppError::InvalidThreshold(format!(
            "threshold must be a positive amount, got {}",
            threshold
        )));
    }
    Ok(rounded)
}

/// Parse a user-supplied threshold such as `"1299"`, `"1 299,50"` or `"990.5"`.
pub fn parse_threshold(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let value: Decimal = cleaned
        .parse()
        .map_err(|_| AppError::InvalidThreshold(format!("'{}' is not a number", raw.trim())))?;

    validate_threshold(value)
}
