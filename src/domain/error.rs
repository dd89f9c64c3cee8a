//! Domain error types.

use crate::domain::symbol::SymbolError;

/// Top-level error type for tradebot.
#[derive(Debug, thiserror::Error)]
pub enum TradebotError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("broker error: {reason}")]
    Broker { reason: String },

    #[error("asset not found: {symbol}")]
    AssetNotFound { symbol: String },

    #[error("no symbol in focus")]
    NotFocused,

    #[error("stream failed after {attempts} attempts: {reason}")]
    StreamFailed { attempts: u32, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradebotError> for std::process::ExitCode {
    fn from(err: &TradebotError) -> Self {
        let code: u8 = match err {
            TradebotError::Io(_) | TradebotError::Csv(_) => 1,
            TradebotError::ConfigParse { .. } | TradebotError::ConfigInvalid { .. } => 2,
            TradebotError::Broker { .. }
            | TradebotError::AssetNotFound { .. }
            | TradebotError::StreamFailed { .. } => 3,
            TradebotError::Symbol(_) | TradebotError::NotFocused => 4,
            TradebotError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
