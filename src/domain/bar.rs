//! Historical price bars.

use crate::domain::asset::DataKind;
use chrono::{DateTime, Duration, Utc};

/// Upper bound on bars requested in one history call.
pub const HISTORY_LIMIT: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub symbol: String,
    pub kind: DataKind,
    pub start: DateTime<Utc>,
    pub step_minutes: u32,
    pub limit: usize,
}

impl HistoryRequest {
    /// Bars of `step_minutes` width covering the last `days` days before `now`.
    ///
    /// A lookback reaching past the earliest representable instant starts there.
    pub fn lookback(
        symbol: &str,
        kind: DataKind,
        days: u32,
        step_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            kind,
            start: Duration::try_days(i64::from(days))
                .and_then(|span| now.checked_sub_signed(span))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            step_minutes: step_minutes.max(1),
            limit: HISTORY_LIMIT,
        }
    }
}
