//! Port traits at the edges of the domain.

pub mod broker_port;
pub mod config_port;
pub mod price_log_port;
