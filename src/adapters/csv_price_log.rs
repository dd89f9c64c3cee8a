//! CSV-backed price log: one append-only file per symbol.

use crate::domain::error::TradebotError;
use crate::domain::price_record::PriceRecord;
use crate::domain::symbol::sanitize_symbol;
use crate::ports::price_log_port::PriceLogPort;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const HEADER: [&str; 2] = ["timestamp", "price"];
pub const FILE_SUFFIX: &str = "_stream.csv";

#[derive(Debug, Clone)]
pub struct CsvPriceLog {
    data_dir: PathBuf,
    symbol: String,
    path: PathBuf,
}

impl CsvPriceLog {
    pub fn new(data_dir: impl Into<PathBuf>, symbol: &str) -> Self {
        let data_dir = data_dir.into();
        let path = data_dir.join(Self::file_name(symbol));
        Self {
            data_dir,
            symbol: symbol.to_string(),
            path,
        }
    }

    /// `BTC/USD` -> `BTC_USD_stream.csv`
    pub fn file_name(symbol: &str) -> String {
        format!("{}{}", sanitize_symbol(symbol), FILE_SUFFIX)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_append(&self, record: &PriceRecord) -> Result<(), TradebotError> {
        fs::create_dir_all(&self.data_dir)?;

        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // An unterminated last row would swallow the new one.
        if len > 0 && !ends_with_newline(&mut file, len)? {
            warn!(path = %self.path.display(), "Price log missing final newline, terminating last row");
            file.write_all(b"\n")?;
        }

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if len == 0 {
            wtr.write_record(HEADER)?;
        }
        wtr.serialize((&record.timestamp, record.price))?;
        wtr.flush()?;
        Ok(())
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl PriceLogPort for CsvPriceLog {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn append(&mut self, record: &PriceRecord) {
        if let Err(e) = self.try_append(record) {
            error!(
                symbol = %self.symbol,
                path = %self.path.display(),
                error = %e,
                "Failed to append price record, write skipped"
            );
        }
    }

    fn read(&self) -> Option<Vec<PriceRecord>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to open price log");
                return None;
            }
        };

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(file);
        let mut records = Vec::new();

        for (line, row) in rdr.deserialize::<PriceRecord>().enumerate() {
            match row {
                Ok(record) => records.push(record),
                // +2: one for the header, one for 1-based numbering
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = line + 2,
                    error = %e,
                    "Skipping malformed price row"
                ),
            }
        }

        Some(records)
    }

    fn clear(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!(symbol = %self.symbol, "Price log cleared"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(symbol = %self.symbol, "Price log already absent")
            }
            Err(e) => error!(
                path = %self.path.display(),
                error = %e,
                "Failed to clear price log"
            ),
        }
    }

    fn read_last_price(&self) -> Option<f64> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read price log");
                return None;
            }
        };

        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() < 2 {
            return None;
        }
        let last = lines[lines.len() - 1];

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(last.as_bytes());
        let parsed = rdr
            .records()
            .next()
            .and_then(|r| r.ok())
            .and_then(|r| r.get(1).and_then(|p| p.trim().parse::<f64>().ok()));

        if parsed.is_none() {
            warn!(path = %self.path.display(), line = last, "Last price row does not parse");
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CsvPriceLog) {
        let dir = TempDir::new().unwrap();
        let log = CsvPriceLog::new(dir.path().join("data"), "BTC/USD");
        (dir, log)
    }

    #[test]
    fn file_name_is_sanitized() {
        assert_eq!(CsvPriceLog::file_name("BTC/USD"), "BTC_USD_stream.csv");
        assert_eq!(CsvPriceLog::file_name("AAPL"), "AAPL_stream.csv");
    }

    #[test]
    fn append_then_read_returns_the_record() {
        let (_dir, mut log) = setup();
        let record = PriceRecord::new("2024-01-01 09:30:00 EST", 123.45);
        log.append(&record);

        assert_eq!(log.read(), Some(vec![record]));
    }

    #[test]
    fn two_appends_write_header_once() {
        let (_dir, mut log) = setup();
        log.append(&PriceRecord::new("2024-01-01 09:30:00 EST", 100.0));
        log.append(&PriceRecord::new("2024-01-01 09:31:00 EST", 101.5));

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            content,
            "timestamp,price\n\
             2024-01-01 09:30:00 EST,100.0\n\
             2024-01-01 09:31:00 EST,101.5\n"
        );
        assert_eq!(log.read_last_price(), Some(101.5));
    }

    #[test]
    fn reopened_log_appends_without_new_header() {
        let (dir, mut first) = setup();
        first.append(&PriceRecord::new("t1", 1.0));

        let mut second = CsvPriceLog::new(dir.path().join("data"), "BTC/USD");
        second.append(&PriceRecord::new("t2", 2.0));

        let records = second.read().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], PriceRecord::new("t2", 2.0));
    }

    #[test]
    fn read_missing_store_is_none() {
        let (_dir, log) = setup();
        assert_eq!(log.read(), None);
        assert_eq!(log.read_last_price(), None);
    }

    #[test]
    fn clear_removes_store_and_is_idempotent() {
        let (_dir, mut log) = setup();
        log.append(&PriceRecord::new("t", 5.0));
        assert!(log.path().exists());

        log.clear();
        assert!(!log.path().exists());
        assert_eq!(log.read(), None);

        log.clear();
        assert!(!log.path().exists());
    }

    #[test]
    fn clear_without_data_creates_nothing() {
        let (dir, mut log) = setup();
        log.clear();
        assert!(!dir.path().join("data").exists());
        assert_eq!(log.read(), None);
    }

    #[test]
    fn last_price_after_single_append() {
        let (_dir, mut log) = setup();
        log.clear();
        assert_eq!(log.read_last_price(), None);
        log.append(&PriceRecord::new("2024-01-01 09:30:00 EST", 123.45));
        assert_relative_eq!(log.read_last_price().unwrap(), 123.45);
    }

    #[test]
    fn header_only_store_has_no_last_price() {
        let (_dir, log) = setup();
        fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        fs::write(log.path(), "timestamp,price\n").unwrap();

        assert_eq!(log.read(), Some(vec![]));
        assert_eq!(log.read_last_price(), None);
    }

    #[test]
    fn append_terminates_unfinished_last_row() {
        let (_dir, mut log) = setup();
        fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        fs::write(log.path(), "timestamp,price\nt1,10.0").unwrap();

        log.append(&PriceRecord::new("t2", 11.0));

        assert_eq!(
            fs::read_to_string(log.path()).unwrap(),
            "timestamp,price\nt1,10.0\nt2,11.0\n"
        );
        assert_eq!(
            log.read(),
            Some(vec![PriceRecord::new("t1", 10.0), PriceRecord::new("t2", 11.0)])
        );
        assert_eq!(log.read_last_price(), Some(11.0));
    }

    #[test]
    fn append_after_unterminated_header_keeps_single_header() {
        let (_dir, mut log) = setup();
        fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        fs::write(log.path(), "timestamp,price").unwrap();

        log.append(&PriceRecord::new("t1", 9.5));

        assert_eq!(
            fs::read_to_string(log.path()).unwrap(),
            "timestamp,price\nt1,9.5\n"
        );
        assert_eq!(log.read_last_price(), Some(9.5));
    }

    #[test]
    fn malformed_last_row_yields_none() {
        let (_dir, log) = setup();
        fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        fs::write(log.path(), "timestamp,price\nt1,10.0\nt2,oops\n").unwrap();

        assert_eq!(log.read_last_price(), None);
    }

    #[test]
    fn read_skips_malformed_rows() {
        let (_dir, log) = setup();
        fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        fs::write(
            log.path(),
            "timestamp,price\nt1,10.0\nbroken\nt3,not-a-number\nt4,12.5\n",
        )
        .unwrap();

        let records = log.read().unwrap();
        assert_eq!(
            records,
            vec![PriceRecord::new("t1", 10.0), PriceRecord::new("t4", 12.5)]
        );
        assert_eq!(log.read_last_price(), Some(12.5));
    }

    #[test]
    fn append_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        // A plain file where the data directory should be.
        let blocker = dir.path().join("data");
        fs::write(&blocker, "not a directory").unwrap();

        let mut log = CsvPriceLog::new(&blocker, "ETH/USD");
        log.append(&PriceRecord::new("t", 1.0));

        assert_eq!(log.read(), None);
        assert_eq!(log.read_last_price(), None);
    }
}
