//! Tradable assets and the market-data feed each one streams from.

use std::fmt;
use std::str::FromStr;

pub const CRYPTO_EXCHANGE: &str = "CRYPTO";

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub asset_class: String,
    pub exchange: String,
    pub tradable: bool,
}

impl Asset {
    pub fn is_crypto(&self) -> bool {
        self.exchange == CRYPTO_EXCHANGE
    }

    pub fn feed(&self) -> MarketFeed {
        if self.is_crypto() {
            MarketFeed::Crypto
        } else {
            MarketFeed::Stock
        }
    }
}

/// Market-data stream an asset is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketFeed {
    /// US crypto feed.
    Crypto,
    /// IEX equities feed.
    Stock,
}

impl MarketFeed {
    pub fn path(&self) -> &'static str {
        match self {
            MarketFeed::Crypto => "v1beta3/crypto/us",
            MarketFeed::Stock => "v2/iex",
        }
    }
}

/// Kind of market data requested from history or stream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Bar,
    Trade,
    Quote,
}

impl DataKind {
    /// Stream channel for this kind. Bar streams listen on trades.
    pub fn channel(&self) -> &'static str {
        match self {
            DataKind::Bar | DataKind::Trade => "trades",
            DataKind::Quote => "quotes",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Bar => write!(f, "BAR"),
            DataKind::Trade => write!(f, "TRADE"),
            DataKind::Quote => write!(f, "QUOTE"),
        }
    }
}

impl FromStr for DataKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BAR" | "BARS" => Ok(DataKind::Bar),
            "TRADE" | "TRADES" => Ok(DataKind::Trade),
            "QUOTE" | "QUOTES" => Ok(DataKind::Quote),
            other => Err(format!("unknown data kind: {other}")),
        }
    }
}

/// What a session asks the broker to stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub symbol: String,
    pub feed: MarketFeed,
    pub kind: DataKind,
}

impl Subscription {
    pub fn for_asset(asset: &Asset, kind: DataKind) -> Self {
        Self {
            symbol: asset.symbol.clone(),
            feed: asset.feed(),
            kind,
        }
    }
}
