//! Offline broker that replays bar CSV files.
//!
//! Bars live in `<bars_dir>/<CODE>_<EXCHANGE>.csv` with the header
//! `timestamp,open,high,low,close,volume` and RFC 3339 timestamps. Each file
//! is one asset. Bars are served at the file's own resolution.

use crate::domain::account::{AccountSnapshot, Order, Position};
use crate::domain::asset::{Asset, CRYPTO_EXCHANGE, DataKind, Subscription};
use crate::domain::bar::{Bar, HistoryRequest};
use crate::domain::error::TradebotError;
use crate::domain::price_record::StreamUpdate;
use crate::ports::broker_port::BrokerPort;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Clone)]
struct BarFile {
    code: String,
    exchange: String,
    path: PathBuf,
}

impl BarFile {
    fn asset(&self) -> Asset {
        let asset_class = if self.exchange == CRYPTO_EXCHANGE {
            "crypto"
        } else {
            "us_equity"
        };
        Asset {
            symbol: self.code.clone(),
            name: self.code.clone(),
            asset_class: asset_class.to_string(),
            exchange: self.exchange.clone(),
            tradable: true,
        }
    }
}

pub struct ReplayBroker {
    bars_dir: PathBuf,
    account_id: String,
    cash: f64,
}

impl ReplayBroker {
    pub fn new(bars_dir: PathBuf, account_id: impl Into<String>, cash: f64) -> Self {
        Self {
            bars_dir,
            account_id: account_id.into(),
            cash,
        }
    }

    fn bar_files(&self) -> Result<Vec<BarFile>, TradebotError> {
        let entries = fs::read_dir(&self.bars_dir).map_err(|e| TradebotError::Broker {
            reason: format!(
                "failed to read bars directory {}: {}",
                self.bars_dir.display(),
                e
            ),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            let Some(stem) = name_str.strip_suffix(".csv") else {
                continue;
            };
            let Some((code, exchange)) = stem.rsplit_once('_') else {
                debug!(file = %name_str, "Ignoring bar file without exchange suffix");
                continue;
            };
            if code.is_empty() || exchange.is_empty() {
                continue;
            }
            files.push(BarFile {
                code: code.to_uppercase(),
                exchange: exchange.to_uppercase(),
                path: entry.path(),
            });
        }

        files.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(files)
    }

    fn find(&self, symbol: &str) -> Result<BarFile, TradebotError> {
        let wanted = symbol.to_uppercase();
        self.bar_files()?
            .into_iter()
            .find(|f| f.code == wanted)
            .ok_or(TradebotError::AssetNotFound {
                symbol: symbol.to_string(),
            })
    }

    fn load_bars(&self, file: &BarFile) -> Result<Vec<Bar>, TradebotError> {
        let mut rdr = csv::Reader::from_path(&file.path)?;
        let mut bars = Vec::new();

        for row in rdr.deserialize::<BarRow>() {
            let row = row?;
            let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
                .map_err(|e| TradebotError::Broker {
                    reason: format!(
                        "invalid timestamp {:?} in {}: {}",
                        row.timestamp,
                        file.path.display(),
                        e
                    ),
                })?
                .with_timezone(&Utc);

            bars.push(Bar {
                symbol: file.code.clone(),
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

impl BrokerPort for ReplayBroker {
    fn account(&self) -> Result<AccountSnapshot, TradebotError> {
        if !self.bars_dir.is_dir() {
            return Err(TradebotError::Broker {
                reason: format!("bars directory {} not found", self.bars_dir.display()),
            });
        }
        Ok(AccountSnapshot {
            id: self.account_id.clone(),
            status: "ACTIVE".to_string(),
            cash: self.cash,
            portfolio_value: self.cash,
            buying_power: self.cash,
        })
    }

    fn positions(&self) -> Result<Vec<Position>, TradebotError> {
        Ok(Vec::new())
    }

    fn orders(&self) -> Result<Vec<Order>, TradebotError> {
        Ok(Vec::new())
    }

    fn asset(&self, symbol: &str) -> Result<Asset, TradebotError> {
        self.find(symbol).map(|f| f.asset())
    }

    fn assets(&self, exchange: &str) -> Result<Vec<Asset>, TradebotError> {
        let wanted = exchange.to_uppercase();
        Ok(self
            .bar_files()?
            .into_iter()
            .filter(|f| f.exchange == wanted)
            .map(|f| f.asset())
            .collect())
    }

    fn bars(&self, request: &HistoryRequest) -> Result<Vec<Bar>, TradebotError> {
        let file = self.find(&request.symbol)?;
        let mut bars: Vec<Bar> = self
            .load_bars(&file)?
            .into_iter()
            .filter(|b| b.timestamp >= request.start)
            .collect();
        bars.truncate(request.limit);
        Ok(bars)
    }

    fn stream(
        &self,
        subscription: &Subscription,
        handler: &mut dyn FnMut(StreamUpdate),
    ) -> Result<(), TradebotError> {
        let file = self.find(&subscription.symbol)?;
        let bars = self.load_bars(&file)?;
        info!(
            symbol = %subscription.symbol,
            feed = subscription.feed.path(),
            channel = subscription.kind.channel(),
            bars = bars.len(),
            "Replaying stream"
        );

        for bar in bars {
            let update = match subscription.kind {
                DataKind::Bar => StreamUpdate::bar(bar.close, bar.timestamp),
                DataKind::Trade | DataKind::Quote => {
                    StreamUpdate::trade(bar.close, Some(bar.timestamp))
                }
            };
            handler(update);
        }
        Ok(())
    }
}
