#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tradebot::domain::account::{AccountSnapshot, Order, Position};
use tradebot::domain::asset::{Asset, Subscription};
use tradebot::domain::bar::{Bar, HistoryRequest};
use tradebot::domain::error::TradebotError;
use tradebot::domain::price_record::StreamUpdate;
use tradebot::domain::retry::ExponentialBackoff;
use tradebot::domain::session::{Session, SessionOptions};
use tradebot::domain::time_context::TimeContext;
use tradebot::ports::broker_port::BrokerPort;
use tradebot::ports::price_log_port::PriceLogPort;

pub struct MockBroker {
    pub account: Option<AccountSnapshot>,
    pub positions: Vec<Position>,
    pub orders: Vec<Order>,
    pub assets: HashMap<String, Asset>,
    pub bars: HashMap<String, Vec<Bar>>,
    pub updates: Vec<StreamUpdate>,
    /// Stream attempts that fail before one succeeds.
    pub stream_failures: Cell<u32>,
    pub stream_calls: Cell<u32>,
    pub subscriptions: RefCell<Vec<Subscription>>,
    pub last_request: RefCell<Option<HistoryRequest>>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self {
            account: Some(AccountSnapshot {
                id: "mock-account".into(),
                status: "ACTIVE".into(),
                cash: 10_000.0,
                portfolio_value: 12_500.0,
                buying_power: 20_000.0,
            }),
            positions: Vec::new(),
            orders: Vec::new(),
            assets: HashMap::new(),
            bars: HashMap::new(),
            updates: Vec::new(),
            stream_failures: Cell::new(0),
            stream_calls: Cell::new(0),
            subscriptions: RefCell::new(Vec::new()),
            last_request: RefCell::new(None),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            account: None,
            ..Self::new()
        }
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.insert(asset.symbol.clone(), asset);
        self
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_updates(mut self, updates: Vec<StreamUpdate>) -> Self {
        self.updates = updates;
        self
    }

    pub fn failing_streams(self, failures: u32) -> Self {
        self.stream_failures.set(failures);
        self
    }
}

impl BrokerPort for MockBroker {
    fn account(&self) -> Result<AccountSnapshot, TradebotError> {
        self.account.clone().ok_or_else(|| TradebotError::Broker {
            reason: "unauthorized".into(),
        })
    }

    fn positions(&self) -> Result<Vec<Position>, TradebotError> {
        Ok(self.positions.clone())
    }

    fn orders(&self) -> Result<Vec<Order>, TradebotError> {
        Ok(self.orders.clone())
    }

    fn asset(&self, symbol: &str) -> Result<Asset, TradebotError> {
        self.assets
            .get(symbol)
            .cloned()
            .ok_or_else(|| TradebotError::AssetNotFound {
                symbol: symbol.to_string(),
            })
    }

    fn assets(&self, exchange: &str) -> Result<Vec<Asset>, TradebotError> {
        Ok(self
            .assets
            .values()
            .filter(|a| a.exchange == exchange)
            .cloned()
            .collect())
    }

    fn bars(&self, request: &HistoryRequest) -> Result<Vec<Bar>, TradebotError> {
        *self.last_request.borrow_mut() = Some(request.clone());
        Ok(self.bars.get(&request.symbol).cloned().unwrap_or_default())
    }

    fn stream(
        &self,
        subscription: &Subscription,
        handler: &mut dyn FnMut(StreamUpdate),
    ) -> Result<(), TradebotError> {
        self.stream_calls.set(self.stream_calls.get() + 1);
        self.subscriptions.borrow_mut().push(subscription.clone());

        let remaining = self.stream_failures.get();
        if remaining > 0 {
            self.stream_failures.set(remaining - 1);
            return Err(TradebotError::Broker {
                reason: "connection reset".into(),
            });
        }

        for update in &self.updates {
            handler(update.clone());
        }
        Ok(())
    }
}

pub fn crypto_asset(symbol: &str) -> Asset {
    Asset {
        symbol: symbol.to_string(),
        name: format!("{symbol} pair"),
        asset_class: "crypto".into(),
        exchange: "CRYPTO".into(),
        tradable: true,
    }
}

pub fn stock_asset(symbol: &str, exchange: &str, tradable: bool) -> Asset {
    Asset {
        symbol: symbol.to_string(),
        name: format!("{symbol} Inc."),
        asset_class: "us_equity".into(),
        exchange: exchange.to_string(),
        tradable,
    }
}

pub fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn make_bar(symbol: &str, at: &str, close: f64) -> Bar {
    Bar {
        symbol: symbol.to_string(),
        timestamp: ts(at),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 10.0,
    }
}

pub fn options(zone: &str) -> SessionOptions {
    SessionOptions {
        name: "test_account".into(),
        paper: true,
        time: TimeContext::new(zone),
        retry: Box::new(ExponentialBackoff::fixed(3, Duration::from_secs(5))),
    }
}

/// Open a session whose retry sleeps are recorded instead of waited out.
pub fn open_recording<L: PriceLogPort>(
    broker: MockBroker,
    log: L,
    zone: &str,
) -> (Session<MockBroker, L>, Rc<RefCell<Vec<Duration>>>) {
    let sleeps = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&sleeps);
    let session = Session::open(options(zone), broker, log)
        .unwrap()
        .with_sleeper(move |d| recorder.borrow_mut().push(d));
    (session, sleeps)
}
