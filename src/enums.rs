use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::error::AppError;

// ─── AlertState ─────────────────────────────────────────────────────

/// Detection state of a tracked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    /// Price is above the threshold, or the item recovered after a streak.
    AboveThreshold,
    /// Price is at or below the threshold and the subscriber has been notified
    /// for the current crossing streak.
    BelowThresholdNotified,
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::AboveThreshold => "above_threshold",
            AlertState::BelowThresholdNotified => "below_threshold_notified",
        }
    }

    pub fn is_notified(&self) -> bool {
        matches!(self, AlertState::BelowThresholdNotified)
    }
}

impl Default for AlertState {
    fn default() -> Self {
        AlertState::AboveThreshold
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "above_threshold" => Ok(AlertState::AboveThreshold),
            "below_threshold_notified" => Ok(AlertState::BelowThresholdNotified),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid alert state: {}. Supported: above_threshold, below_threshold_notified",
                s
            ))),
        }
    }
}

// ─── DeliveryStatus ─────────────────────────────────────────────────

/// Delivery status of a queued notification event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DeliveryStatus::Pending),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "failed" => Ok(DeliveryStatus::Failed),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid delivery status: {}. Supported: pending, delivered, failed",
                s
            ))),
        }
    }
}
