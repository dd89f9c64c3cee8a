//! Trading symbol helpers.
//!
//! Symbols arrive in pair form (`BTC/USD`). Price log files use the
//! sanitized form (`BTC_USD`) and asset lookups use the compact form
//! (`BTCUSD`).

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// File-name form of a symbol: every `/` becomes `_`.
pub fn sanitize_symbol(symbol: &str) -> String {
    symbol.replace('/', "_")
}

/// Asset lookup form of a symbol: every `/` is dropped.
pub fn lookup_symbol(symbol: &str) -> String {
    symbol.replace('/', "")
}

/// Parse a comma-separated symbol list into upper-cased symbols.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, SymbolError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SymbolError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(SymbolError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}
