//! Typed runtime settings built from configuration.
//!
//! Every key is optional. Values that are present but unusable are
//! rejected with [`TradebotError::ConfigInvalid`].

use crate::domain::error::TradebotError;
use crate::domain::retry::ExponentialBackoff;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_SESSION_NAME: &str = "main_trading_account";
pub const DEFAULT_SYMBOL: &str = "BTC/USD";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BARS_DIR: &str = "bars";
pub const DEFAULT_REPLAY_CASH: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub session_name: String,
    pub paper: bool,
    /// Symbol used when a command is not given one.
    pub symbol: String,
    /// Display zone; `None` leaves the session on UTC.
    pub timezone: Option<String>,
    pub data_dir: PathBuf,
    pub bars_dir: PathBuf,
    pub retry: ExponentialBackoff,
    pub replay_account_id: String,
    pub replay_cash: f64,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradebotError> {
        let retry = build_retry(config)?;

        let replay_cash = config.get_double("replay", "cash", DEFAULT_REPLAY_CASH);
        if !replay_cash.is_finite() || replay_cash < 0.0 {
            return Err(invalid("replay", "cash", "cash must be non-negative"));
        }

        Ok(Self {
            session_name: config
                .get_string("session", "name")
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
            paper: config.get_bool("session", "paper", true),
            symbol: config
                .get_string("session", "symbol")
                .map(|s| s.to_uppercase())
                .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            timezone: config.get_string("session", "timezone"),
            data_dir: config
                .get_string("data", "dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            bars_dir: config
                .get_string("data", "bars_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BARS_DIR)),
            retry,
            replay_account_id: config
                .get_string("replay", "account_id")
                .unwrap_or_else(|| "replay".to_string()),
            replay_cash,
        })
    }
}

fn build_retry(config: &dyn ConfigPort) -> Result<ExponentialBackoff, TradebotError> {
    let defaults = ExponentialBackoff::default();

    let max_attempts = config.get_int("retry", "max_attempts", i64::from(defaults.max_attempts));
    if !(1..=i64::from(u32::MAX)).contains(&max_attempts) {
        return Err(invalid("retry", "max_attempts", "max_attempts must be at least 1"));
    }

    let multiplier = config.get_double("retry", "multiplier", defaults.multiplier);
    if !multiplier.is_finite() || multiplier < 1.0 {
        return Err(invalid("retry", "multiplier", "multiplier must be at least 1.0"));
    }

    let initial_delay = config
        .get_duration_ms("retry", "initial_delay_ms", defaults.initial_delay)
        .ok_or_else(|| invalid("retry", "initial_delay_ms", "initial_delay_ms must not be negative"))?;
    let max_delay = config
        .get_duration_ms("retry", "max_delay_ms", defaults.max_delay)
        .ok_or_else(|| invalid("retry", "max_delay_ms", "max_delay_ms must not be negative"))?;
    if max_delay < initial_delay {
        return Err(invalid(
            "retry",
            "max_delay_ms",
            "max_delay_ms must not be below initial_delay_ms",
        ));
    }

    Ok(ExponentialBackoff::new(
        max_attempts as u32,
        initial_delay,
        max_delay,
        multiplier,
    ))
}

fn invalid(section: &str, key: &str, reason: &str) -> TradebotError {
    TradebotError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
