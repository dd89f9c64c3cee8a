//! Brokerage access port trait.
//!
//! The brokerage is an opaque remote service. Everything the session needs
//! from it goes through this trait.

use crate::domain::account::{AccountSnapshot, Order, Position};
use crate::domain::asset::{Asset, Subscription};
use crate::domain::bar::{Bar, HistoryRequest};
use crate::domain::error::TradebotError;
use crate::domain::price_record::StreamUpdate;

pub trait BrokerPort {
    fn account(&self) -> Result<AccountSnapshot, TradebotError>;

    fn positions(&self) -> Result<Vec<Position>, TradebotError>;

    fn orders(&self) -> Result<Vec<Order>, TradebotError>;

    /// Look up one asset by its compact symbol (`BTCUSD`).
    fn asset(&self, symbol: &str) -> Result<Asset, TradebotError>;

    /// All assets listed on `exchange`.
    fn assets(&self, exchange: &str) -> Result<Vec<Asset>, TradebotError>;

    fn bars(&self, request: &HistoryRequest) -> Result<Vec<Bar>, TradebotError>;

    /// Run a stream to completion, handing every update to `handler`.
    fn stream(
        &self,
        subscription: &Subscription,
        handler: &mut dyn FnMut(StreamUpdate),
    ) -> Result<(), TradebotError>;
}
