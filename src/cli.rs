//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_price_log::CsvPriceLog;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::replay_broker::ReplayBroker;
use crate::domain::asset::DataKind;
use crate::domain::bar::Bar;
use crate::domain::error::TradebotError;
use crate::domain::session::{Session, SessionOptions};
use crate::domain::settings::Settings;
use crate::domain::symbol::parse_symbols;
use crate::domain::time_context::TimeContext;
use crate::ports::price_log_port::PriceLogPort;

/// Bars shown from the tail of the history before streaming.
const HISTORY_TAIL: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "tradebot", about = "Trading bot with a streaming price log")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the account, recent history, then stream prices into the log
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma-separated symbols; the first one is streamed
        #[arg(short, long)]
        symbol: Option<String>,
        /// Days of history to load
        #[arg(long, default_value_t = 1)]
        days: u32,
        /// Bar width in minutes
        #[arg(long, default_value_t = 5)]
        step: u32,
        #[arg(long, default_value = "bar")]
        kind: DataKind,
    },
    /// Print the account summary
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List tradable symbols on an exchange
    ListSymbols {
        #[arg(long)]
        exchange: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print every logged price for a symbol
    Prices {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        symbol: Option<String>,
    },
    /// Print the last logged price for a symbol
    Last {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        symbol: Option<String>,
    },
    /// Delete a symbol's price log
    Clear {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        symbol: Option<String>,
    },
    /// Print the current time in a zone
    Now {
        #[arg(long)]
        zone: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            symbol,
            days,
            step,
            kind,
        } => run_stream(config.as_ref(), symbol.as_deref(), days, step, kind),
        Command::Info { config } => run_info(config.as_ref()),
        Command::ListSymbols { exchange, config } => run_list_symbols(&exchange, config.as_ref()),
        Command::Prices { config, symbol } => run_prices(config.as_ref(), symbol.as_deref()),
        Command::Last { config, symbol } => run_last(config.as_ref(), symbol.as_deref()),
        Command::Clear { config, symbol } => run_clear(config.as_ref(), symbol.as_deref()),
        Command::Now { zone, config } => run_now(zone.as_deref(), config.as_ref()),
    }
}

fn fail(err: &TradebotError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

/// Settings from `path`, or defaults when no config file is given.
pub fn load_settings(path: Option<&PathBuf>) -> Result<Settings, TradebotError> {
    match path {
        Some(p) => Settings::from_config(&FileConfigAdapter::from_file(p)?),
        None => Settings::from_config(&FileConfigAdapter::empty()),
    }
}

pub fn time_context(settings: &Settings) -> TimeContext {
    settings
        .timezone
        .as_deref()
        .map(TimeContext::new)
        .unwrap_or_default()
}

pub fn open_session(
    settings: &Settings,
    symbol: &str,
) -> Result<Session<ReplayBroker, CsvPriceLog>, TradebotError> {
    let broker = ReplayBroker::new(
        settings.bars_dir.clone(),
        settings.replay_account_id.clone(),
        settings.replay_cash,
    );
    let price_log = CsvPriceLog::new(settings.data_dir.clone(), symbol);
    let options = SessionOptions {
        name: settings.session_name.clone(),
        paper: settings.paper,
        time: time_context(settings),
        retry: Box::new(settings.retry.clone()),
    };
    Session::open(options, broker, price_log)
}

fn resolve_symbol(symbol: Option<&str>, settings: &Settings) -> String {
    symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| settings.symbol.clone())
}

pub fn format_bar(bar: &Bar, time: &mut TimeContext) -> String {
    format!(
        "{}  O {:.2}  H {:.2}  L {:.2}  C {:.2}  V {}",
        time.normalize_text(Some(bar.timestamp.into()), None),
        bar.open,
        bar.high,
        bar.low,
        bar.close,
        bar.volume
    )
}

fn run_stream(
    config_path: Option<&PathBuf>,
    symbol: Option<&str>,
    days: u32,
    step: u32,
    kind: DataKind,
) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let symbols = match parse_symbols(&resolve_symbol(symbol, &settings)) {
        Ok(s) => s,
        Err(e) => return fail(&TradebotError::from(e)),
    };
    let symbol = symbols[0].clone();

    let mut session = match open_session(&settings, &symbol) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    match session.summary() {
        Ok(summary) => println!("{}", summary.render()),
        Err(e) => eprintln!("warning: account summary unavailable: {e}"),
    }

    let requested: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let focused = session.focus(&requested);
    if focused[0].is_none() {
        return fail(&TradebotError::AssetNotFound { symbol });
    }

    let bars = match session.history(DataKind::Bar, days, step) {
        Ok(b) => b,
        Err(e) => {
            session.cleanup();
            return fail(&e);
        }
    };

    println!("Last {} bars for {}:", bars.len().min(HISTORY_TAIL), symbol);
    let tail_start = bars.len().saturating_sub(HISTORY_TAIL);
    for bar in &bars[tail_start..] {
        println!("  {}", format_bar(bar, session.time_context_mut()));
    }

    eprintln!("\nStarting {} stream for {}...", kind, symbol);
    let result = session.stream(kind);
    session.cleanup();

    match result {
        Ok(count) => {
            eprintln!(
                "Logged {} prices to {}",
                count,
                session.price_log().path().display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_info(config_path: Option<&PathBuf>) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let session = match open_session(&settings, &settings.symbol) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    match session.summary() {
        Ok(summary) => {
            print!("{}", summary.render());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_list_symbols(exchange: &str, config_path: Option<&PathBuf>) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let session = match open_session(&settings, &settings.symbol) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let symbols = match session.list_symbols(exchange) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found for exchange {}", exchange);
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn price_log_for(
    config_path: Option<&PathBuf>,
    symbol: Option<&str>,
) -> Result<CsvPriceLog, TradebotError> {
    let settings = load_settings(config_path)?;
    let symbol = resolve_symbol(symbol, &settings);
    Ok(CsvPriceLog::new(settings.data_dir, &symbol))
}

fn run_prices(config_path: Option<&PathBuf>, symbol: Option<&str>) -> ExitCode {
    let log = match price_log_for(config_path, symbol) {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };

    match log.read() {
        Some(records) => {
            println!("timestamp,price");
            for r in &records {
                println!("{},{}", r.timestamp, r.price);
            }
            eprintln!("{} prices for {}", records.len(), log.symbol());
            ExitCode::SUCCESS
        }
        None => fail(&TradebotError::NoData {
            symbol: log.symbol().to_string(),
        }),
    }
}

fn run_last(config_path: Option<&PathBuf>, symbol: Option<&str>) -> ExitCode {
    let log = match price_log_for(config_path, symbol) {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };

    match log.read_last_price() {
        Some(price) => {
            println!("{}", price);
            ExitCode::SUCCESS
        }
        None => fail(&TradebotError::NoData {
            symbol: log.symbol().to_string(),
        }),
    }
}

fn run_clear(config_path: Option<&PathBuf>, symbol: Option<&str>) -> ExitCode {
    let mut log = match price_log_for(config_path, symbol) {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };

    log.clear();
    eprintln!("Cleared price log for {}", log.symbol());
    ExitCode::SUCCESS
}

fn run_now(zone: Option<&str>, config_path: Option<&PathBuf>) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let mut time = time_context(&settings);
    println!("{}", time.normalize_text(None, zone));
    ExitCode::SUCCESS
}
