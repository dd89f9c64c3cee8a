//! Timezone-aware timestamp normalization.
//!
//! Every session owns one [`TimeContext`]. It holds the active display zone
//! and converts instants into it. Invalid zone identifiers never fail: they
//! degrade to UTC with a warning.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

/// Fallback zone used when nothing (valid) has been configured.
pub const UNIVERSAL_ZONE: Tz = Tz::UTC;

/// `YYYY-MM-DD HH:MM:SS <abbreviation>`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// An instant to normalize, with or without zone information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestamp {
    /// Wall-clock time without a zone. Interpreted as UTC.
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

impl Timestamp {
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Timestamp::Naive(naive) => naive.and_utc(),
            Timestamp::Aware(aware) => aware.with_timezone(&Utc),
        }
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Timestamp::Naive(value)
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Timestamp::Aware(value)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Aware(value.fixed_offset())
    }
}

impl From<DateTime<Tz>> for Timestamp {
    fn from(value: DateTime<Tz>) -> Self {
        Timestamp::Aware(value.fixed_offset())
    }
}

/// Per-session display zone.
#[derive(Debug, Clone, Default)]
pub struct TimeContext {
    zone: Option<Tz>,
}

impl TimeContext {
    /// Build a context for `zone`, falling back to UTC if it does not resolve.
    pub fn new(zone: &str) -> Self {
        let mut ctx = Self::default();
        ctx.set_zone(zone);
        ctx
    }

    pub fn utc() -> Self {
        Self {
            zone: Some(UNIVERSAL_ZONE),
        }
    }

    /// The configured zone, if any has been set yet.
    pub fn zone(&self) -> Option<Tz> {
        self.zone
    }

    /// Resolve and activate `zone`. Returns the zone actually in effect.
    pub fn set_zone(&mut self, zone: &str) -> Tz {
        let resolved = match zone.parse::<Tz>() {
            Ok(tz) => {
                info!(zone = tz.name(), "Timezone set");
                tz
            }
            Err(e) => {
                warn!(zone, error = %e, "Invalid timezone, falling back to UTC");
                UNIVERSAL_ZONE
            }
        };
        self.zone = Some(resolved);
        resolved
    }

    /// Active zone; an unset context self-heals to UTC.
    pub fn active_zone(&mut self) -> Tz {
        *self.zone.get_or_insert_with(|| {
            debug!("No timezone configured, defaulting to UTC");
            UNIVERSAL_ZONE
        })
    }

    /// Convert `timestamp` (or the current instant) into the active zone.
    ///
    /// When `zone` is given it replaces the active zone for every later call.
    pub fn normalize(&mut self, timestamp: Option<Timestamp>, zone: Option<&str>) -> DateTime<Tz> {
        if let Some(zone) = zone {
            self.set_zone(zone);
        }
        let tz = self.active_zone();
        let instant = timestamp.map_or_else(Utc::now, |t| t.to_utc());
        instant.with_timezone(&tz)
    }

    /// Same as [`normalize`](Self::normalize), rendered with [`TIMESTAMP_FORMAT`].
    pub fn normalize_text(&mut self, timestamp: Option<Timestamp>, zone: Option<&str>) -> String {
        format_timestamp(&self.normalize(timestamp, zone))
    }

    /// Current instant in the active zone.
    pub fn now(&mut self) -> DateTime<Tz> {
        self.normalize(None, None)
    }
}

pub fn format_timestamp(dt: &DateTime<Tz>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}
