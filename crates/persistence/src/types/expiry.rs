//! Expiry classification shared by both backends.
//!
//! Adapters only fetch candidates (items with any expiry date on or before the
//! threshold); the bucket assignment happens here so the boundary behavior is
//! identical regardless of the active store.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::item::Item;

/// Which bucket an item falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryBucket {
    /// At least one date is strictly before today.
    Expired,
    /// No date is expired and at least one falls in `[today, today + days]`.
    NearExpiry,
}

/// Items grouped by expiry state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpiryReport {
    pub expired: Vec<Item>,
    pub near_expiry: Vec<Item>,
}

impl ExpiryReport {
    /// Returns the total number of items in both buckets.
    pub fn len(&self) -> usize {
        self.expired.len() + self.near_expiry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.near_expiry.is_empty()
    }
}

/// Latest date both backends store as a four-digit-year ISO string.
pub fn latest_storable_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Returns the last date that still counts as near-expiry.
///
/// Saturates at [`latest_storable_date`] so the stored ISO strings keep
/// comparing in date order.
pub fn threshold_date(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
        .min(latest_storable_date())
}

/// Classifies one item.
pub fn classify(item: &Item, today: NaiveDate, threshold: NaiveDate) -> Option<ExpiryBucket> {
    let dates = [item.warranty_expiry, item.usage_expiry];
    let dates = dates.iter().flatten();

    if dates.clone().any(|d| *d < today) {
        return Some(ExpiryBucket::Expired);
    }
    if dates.into_iter().any(|d| *d >= today && *d <= threshold) {
        return Some(ExpiryBucket::NearExpiry);
    }
    None
}

/// Splits candidate items into buckets.
///
/// Each item lands in at most one bucket. Buckets are ordered by earliest
/// expiry date, then `ItemID`, and duplicate candidates are dropped.
pub fn build_report(candidates: Vec<Item>, today: NaiveDate, days: u32) -> ExpiryReport {
    let threshold = threshold_date(today, days);
    let mut report = ExpiryReport::default();
    let mut seen = std::collections::HashSet::new();

    for item in candidates {
        if !seen.insert(item.item_id.clone()) {
            continue;
        }
        match classify(&item, today, threshold) {
            Some(ExpiryBucket::Expired) => report.expired.push(item),
            Some(ExpiryBucket::NearExpiry) => report.near_expiry.push(item),
            None => {}
        }
    }

    let order = |a: &Item, b: &Item| {
        a.earliest_expiry()
            .cmp(&b.earliest_expiry())
            .then_with(|| a.item_id.cmp(&b.item_id))
    };
    report.expired.sort_by(order);
    report.near_expiry.sort_by(order);
    report
}
