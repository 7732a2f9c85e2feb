//! Per-item threshold state machine.
//!
//! Each tracked item is either `above_threshold` or
//! `below_threshold_notified`. The transition into the notified state is the
//! only one that produces a notification; the way back is silent. The first
//! observation an item ever sees only seeds the state, so an item that is
//! already cheap when tracking starts does not fire until it has recovered
//! and dropped again.

use sea_orm::prelude::Decimal;

use crate::enums::AlertState;
use crate::models::{ PriceObservation, TrackedItem };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First observation for the item; state set without notifying.
    Seeded,
    /// Price moved but the state did not.
    Unchanged,
    /// Crossed below the threshold; one notification must be emitted.
    Notify,
    /// Recovered above the threshold; notified flag cleared.
    Reset,
    /// Not newer than the last applied observation; ignored.
    Stale,
}

impl Outcome {
    pub fn changes_item(&self) -> bool {
        !matches!(self, Outcome::Stale)
    }
}

/// `true` when the price counts as crossed for this threshold.
pub fn is_below(price: Decimal, threshold: Decimal) -> bool {
    price <= threshold
}

fn state_for(price: Decimal, threshold: Decimal) -> AlertState {
    if is_below(price, threshold) {
        AlertState::BelowThresholdNotified
    } else {
        AlertState::AboveThreshold
    }
}

/// Decide what an observation does to an item without touching it.
pub fn evaluate(item: &TrackedItem, observation: &PriceObservation) -> Outcome {
    let Some(last_seen) = item.last_observed_at else {
        return Outcome::Seeded;
    };

    if observation.observed_at <= last_seen {
        return Outcome::Stale;
    }

    match (item.state, is_below(observation.price, item.threshold)) {
        (AlertState::AboveThreshold, true) => Outcome::Notify,
        (AlertState::BelowThresholdNotified, false) => Outcome::Reset,
        _ => Outcome::Unchanged,
    }
}

/// Apply an observation to an item and return what happened.
pub fn apply(item: &mut TrackedItem, observation: &PriceObservation) -> Outcome {
    let outcome = evaluate(item, observation);

    match outcome {
        Outcome::Stale => {
            return outcome;
        }
        Outcome::Seeded => {
            item.state = state_for(observation.price, item.threshold);
        }
        Outcome::Notify => {
            item.state = AlertState::BelowThresholdNotified;
            item.notified_at = Some(observation.observed_at);
        }
        Outcome::Reset => {
            item.state = AlertState::AboveThreshold;
        }
        Outcome::Unchanged => {}
    }

    item.last_price = Some(observation.price);
    item.last_observed_at = Some(observation.observed_at);
    outcome
}

/// Change the threshold and re-derive the state from the last known price.
///
/// Never produces a notification: a new threshold that is already above the
/// current price starts a streak that counts as notified.
pub fn rethreshold(item: &mut TrackedItem, threshold: Decimal) {
    item.threshold = threshold;
    if let Some(price) = item.last_price {
        item.state = state_for(price, threshold);
    }
}
