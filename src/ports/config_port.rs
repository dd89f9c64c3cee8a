//! Configuration access port trait.

use std::time::Duration;

/// Typed lookups into `[section] key` configuration. Missing or unparsable
/// values fall back to the supplied default.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Millisecond value read as a `Duration`. `None` when the value is negative.
    fn get_duration_ms(&self, section: &str, key: &str, default: Duration) -> Option<Duration> {
        let default_ms = i64::try_from(default.as_millis()).unwrap_or(i64::MAX);
        let ms = self.get_int(section, key, default_ms);
        u64::try_from(ms).ok().map(Duration::from_millis)
    }
}
