//! Streamed prices and the records they become in the price log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a price log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Rendered in the session's display zone.
    pub timestamp: String,
    pub price: f64,
}

impl PriceRecord {
    pub fn new(timestamp: impl Into<String>, price: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            price,
        }
    }
}

/// One event delivered by a live stream.
///
/// Bars carry `close`, trades carry `price`; either may carry a timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamUpdate {
    pub close: Option<f64>,
    pub price: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Bar,
    Trade,
    Other,
}

impl StreamUpdate {
    pub fn bar(close: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            close: Some(close),
            price: None,
            timestamp: Some(timestamp),
        }
    }

    pub fn trade(price: f64, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            close: None,
            price: Some(price),
            timestamp,
        }
    }

    pub fn kind(&self) -> UpdateKind {
        if self.close.is_some() {
            UpdateKind::Bar
        } else if self.price.is_some() {
            UpdateKind::Trade
        } else {
            UpdateKind::Other
        }
    }

    /// `close` wins over `price` when both are present.
    pub fn extract_price(&self) -> Option<f64> {
        self.close.or(self.price)
    }
}
