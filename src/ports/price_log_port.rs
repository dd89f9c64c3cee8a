//! Per-symbol price log port trait.
//!
//! Every operation is best-effort: failures are reported through logging
//! and never surface to the caller.

use crate::domain::price_record::PriceRecord;

pub trait PriceLogPort {
    /// Symbol this log records, as given at construction.
    fn symbol(&self) -> &str;

    /// Append one record, creating the store (with header) if needed.
    fn append(&mut self, record: &PriceRecord);

    /// All records in append order, or `None` when the store does not exist.
    fn read(&self) -> Option<Vec<PriceRecord>>;

    /// Remove the store. A missing store is not an error.
    fn clear(&mut self);

    /// Price of the final record, if there is one and it parses.
    fn read_last_price(&self) -> Option<f64>;
}
