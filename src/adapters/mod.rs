//! Concrete adapter implementations for ports.

pub mod csv_price_log;
pub mod file_config_adapter;
pub mod replay_broker;
