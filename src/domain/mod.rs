//! Core domain types and logic.

pub mod account;
pub mod asset;
pub mod bar;
pub mod error;
pub mod price_record;
pub mod retry;
pub mod session;
pub mod settings;
pub mod symbol;
pub mod time_context;
