//! Trading session: one account, one price log, one display zone.
//!
//! A session is built with everything it uses. The broker, the price log,
//! the time context and the retry strategy are all injected at
//! construction and owned per instance.

use crate::domain::account::AccountSummary;
use crate::domain::asset::{Asset, DataKind, Subscription};
use crate::domain::bar::{Bar, HistoryRequest};
use crate::domain::error::TradebotError;
use crate::domain::price_record::{PriceRecord, StreamUpdate};
use crate::domain::retry::{self, RetryStrategy};
use crate::domain::symbol::lookup_symbol;
use crate::domain::time_context::{TimeContext, Timestamp};
use crate::ports::broker_port::BrokerPort;
use crate::ports::price_log_port::PriceLogPort;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Construction parameters that are not ports.
pub struct SessionOptions {
    pub name: String,
    pub paper: bool,
    pub time: TimeContext,
    pub retry: Box<dyn RetryStrategy>,
}

pub struct Session<B: BrokerPort, L: PriceLogPort> {
    name: String,
    paper: bool,
    broker: B,
    price_log: L,
    time: TimeContext,
    retry: Box<dyn RetryStrategy>,
    sleeper: Box<dyn FnMut(Duration)>,
    focused: Vec<Asset>,
}

impl<B: BrokerPort, L: PriceLogPort> Session<B, L> {
    /// Verify access to the account and build the session.
    pub fn open(options: SessionOptions, broker: B, price_log: L) -> Result<Self, TradebotError> {
        let account = broker.account().map_err(|e| {
            let reason = match e {
                TradebotError::Broker { reason } => reason,
                other => other.to_string(),
            };
            TradebotError::Broker {
                reason: format!("failed to connect to trading account: {reason}"),
            }
        })?;

        info!(
            name = %options.name,
            account_id = %account.id,
            status = %account.status,
            "Trading account ready"
        );
        if options.paper {
            info!("Paper trading mode enabled");
        }

        Ok(Self {
            name: options.name,
            paper: options.paper,
            broker,
            price_log,
            time: options.time,
            retry: options.retry,
            sleeper: Box::new(std::thread::sleep),
            focused: Vec::new(),
        })
    }

    /// Replace how retry delays are waited out.
    pub fn with_sleeper(mut self, sleeper: impl FnMut(Duration) + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_paper(&self) -> bool {
        self.paper
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn price_log(&self) -> &L {
        &self.price_log
    }

    pub fn price_log_mut(&mut self) -> &mut L {
        &mut self.price_log
    }

    pub fn time_context(&self) -> &TimeContext {
        &self.time
    }

    pub fn time_context_mut(&mut self) -> &mut TimeContext {
        &mut self.time
    }

    /// The primary focused asset.
    pub fn focused(&self) -> Option<&Asset> {
        self.focused.first()
    }

    pub fn focused_assets(&self) -> &[Asset] {
        &self.focused
    }

    pub fn summary(&self) -> Result<AccountSummary, TradebotError> {
        Ok(AccountSummary {
            account: self.broker.account()?,
            positions: self.broker.positions()?,
            orders: self.broker.orders()?,
        })
    }

    /// Tradable symbols listed on `exchange`.
    pub fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, TradebotError> {
        let mut symbols: Vec<String> = self
            .broker
            .assets(exchange)?
            .into_iter()
            .filter(|a| a.tradable)
            .map(|a| a.symbol)
            .collect();
        symbols.sort();
        Ok(symbols)
    }

    /// Look up each symbol and focus on the ones that resolve.
    ///
    /// The result lines up with `symbols`; a failed lookup is `None`.
    pub fn focus(&mut self, symbols: &[&str]) -> Vec<Option<Asset>> {
        let mut results = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            match self.broker.asset(&lookup_symbol(symbol)) {
                Ok(asset) => {
                    info!(
                        symbol = %asset.symbol,
                        name = %asset.name,
                        asset_class = %asset.asset_class,
                        tradable = asset.tradable,
                        "Asset in focus"
                    );
                    results.push(Some(asset));
                }
                Err(e) => {
                    warn!(
                        symbol,
                        error = %e,
                        "Could not focus symbol; check it is correct and available for trading"
                    );
                    results.push(None);
                }
            }
        }

        self.focused = results.iter().flatten().cloned().collect();
        results
    }

    /// Bars for the focused asset covering the last `days` days.
    pub fn history(
        &self,
        kind: DataKind,
        days: u32,
        step_minutes: u32,
    ) -> Result<Vec<Bar>, TradebotError> {
        let asset = self.focused().ok_or(TradebotError::NotFocused)?;
        let request = HistoryRequest::lookback(&asset.symbol, kind, days, step_minutes, Utc::now());
        let bars = self.broker.bars(&request)?;
        info!(
            symbol = %asset.symbol,
            bars = bars.len(),
            "{} history from {} days, by {} minutes",
            kind,
            days,
            request.step_minutes
        );
        Ok(bars)
    }

    /// Stream the focused asset into the price log. Returns how many updates
    /// were logged.
    pub fn stream(&mut self, kind: DataKind) -> Result<usize, TradebotError> {
        let asset = self.focused().ok_or(TradebotError::NotFocused)?;
        let subscription = Subscription::for_asset(asset, kind);
        info!(
            symbol = %subscription.symbol,
            feed = subscription.feed.path(),
            "{} stream",
            kind
        );

        let Session {
            broker,
            price_log,
            time,
            retry: strategy,
            sleeper,
            ..
        } = self;

        let mut logged = 0usize;
        let result = retry::retry(
            &**strategy,
            "stream",
            |delay| sleeper(delay),
            |attempt| {
                debug!(attempt, "Connecting stream");
                broker.stream(&subscription, &mut |update| {
                    if log_update(price_log, time, update) {
                        logged += 1;
                    }
                })
            },
        );

        match result {
            Ok(()) => Ok(logged),
            Err(e) => Err(TradebotError::StreamFailed {
                attempts: strategy.max_attempts(),
                reason: e.to_string(),
            }),
        }
    }

    /// Log one streamed update. Returns whether a record was written.
    pub fn on_update(&mut self, update: StreamUpdate) -> bool {
        log_update(&mut self.price_log, &mut self.time, update)
    }

    /// Drop local state. Positions and orders at the broker are untouched.
    pub fn cleanup(&mut self) {
        self.focused.clear();
        info!(name = %self.name, "Removed access to account");
    }
}

fn log_update<L: PriceLogPort>(
    price_log: &mut L,
    time: &mut TimeContext,
    update: StreamUpdate,
) -> bool {
    let Some(price) = update.extract_price() else {
        warn!(?update, "Stream update without price ignored");
        return false;
    };
    let timestamp = time.normalize_text(update.timestamp.map(Timestamp::from), None);
    debug!(kind = ?update.kind(), %timestamp, price, "Price update");
    price_log.append(&PriceRecord::new(timestamp, price));
    true
}
