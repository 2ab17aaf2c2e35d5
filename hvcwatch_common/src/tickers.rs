//! Ticker symbols and extraction of symbols from alert subject lines.
//!
//! Alert subjects come in two flavours:
//! - the trading platform's watchlist phrase, `Alert: New symbols: ATAI, DFSU were added to HVC.`,
//!   where only the comma-separated list is considered;
//! - free text such as `Alert: AAPL breakout`, which is scanned for uppercase tokens
//!   bounded by non-alphanumeric separators.
//!
//! Tokens touching a `/` are futures contracts or multi-leg option spreads
//! (`/ZQU25`, `AAPL/SPY`) and are never returned.
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WatchError;

/// Marker for futures contracts and option spreads.
const SPREAD_MARKER: char = '/';

/// 1-5 uppercase alphanumerics starting with a letter, optional class suffix (`BRK.B`).
static SYMBOL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Z0-9]{0,4}(?:\.[A-Z]{1,2})?$").expect("symbol shape pattern is valid")
});

static WATCHLIST_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)symbols?:\s*([\w/,\s]+)\s+(?:were|was)\s+added")
        .expect("watchlist phrase pattern is valid")
});

/// Validated, uppercase ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TickerSymbol(String);

impl TickerSymbol {
    /// Symbol text, always uppercase.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TickerSymbol {
    type Err = WatchError;

    /// Parses an already-uppercase token. Lowercase input is rejected; callers that
    /// accept mixed case upper-case first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(SPREAD_MARKER) || !SYMBOL_SHAPE.is_match(s) {
            return Err(WatchError::InvalidSymbol(s.to_string()));
        }
        Ok(TickerSymbol(s.to_string()))
    }
}

impl TryFrom<String> for TickerSymbol {
    type Error = WatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().to_ascii_uppercase().parse()
    }
}

impl From<TickerSymbol> for String {
    fn from(symbol: TickerSymbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the set of candidate ticker symbols from an alert subject.
///
/// Deterministic and free of I/O. An empty set means "nothing to process" and is
/// not an error.
pub fn extract_tickers(subject: &str) -> BTreeSet<TickerSymbol> {
    match WATCHLIST_PHRASE.captures(subject).and_then(|caps| caps.get(1)) {
        Some(list) => list
            .as_str()
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.contains(SPREAD_MARKER))
            .filter_map(|entry| entry.to_ascii_uppercase().parse().ok())
            .collect(),
        None => scan_tokens(subject)
            .filter(|token| !token.contains(SPREAD_MARKER))
            .filter_map(|token| token.parse().ok())
            .collect(),
    }
}

/// Splits on everything except alphanumerics (any script), `/` and `.`, so spread
/// legs stay attached to each other, class suffixes stay attached to their root
/// and accented words are never cut into symbol-shaped pieces.
fn scan_tokens(subject: &str) -> impl Iterator<Item = &str> {
    subject
        .split(|c: char| !(c.is_alphanumeric() || c == SPREAD_MARKER || c == '.'))
        .map(|token| token.trim_matches('.'))
        .filter(|token| !token.is_empty())
}

/// Logo location used when the enrichment document carries none.
pub fn logo_url_for(symbol: &TickerSymbol) -> String {
    format!(
        "https://static.stocktitan.net/company-logo/{}.webp",
        symbol.as_str().to_ascii_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(subject: &str) -> Vec<String> {
        extract_tickers(subject)
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn free_text_yields_bounded_uppercase_tokens() {
        assert_eq!(symbols("Alert: AAPL breakout"), vec!["AAPL"]);
        assert_eq!(symbols("NVDA, TSLA and NVDA again"), vec!["NVDA", "TSLA"]);
    }

    #[test]
    fn spread_legs_are_excluded() {
        assert!(symbols("AAPL/SPY spread").is_empty());
        assert_eq!(symbols("MSFT up, AAPL/SPY spread"), vec!["MSFT"]);
    }

    #[test]
    fn substrings_of_words_do_not_match() {
        assert!(symbols("Random text without tickers").is_empty());
        assert!(symbols("Quarterly earnings in 2024").is_empty());
    }

    #[test]
    fn accented_words_are_not_split() {
        assert!(symbols("Breakout in MÜNCHEN shares").is_empty());
        assert_eq!(symbols("ÉCOLE and NVDA"), vec!["NVDA"]);
    }

    #[test]
    fn watchlist_phrase_restricts_to_the_listed_symbols() {
        assert_eq!(
            symbols("Alert: New symbols: ATAI, DFSU were added to HVC."),
            vec!["ATAI", "DFSU"]
        );
        assert_eq!(
            symbols("Alert: New symbol: LXEO was added to HVC."),
            vec!["LXEO"]
        );
        assert_eq!(
            symbols("Alert: New symbols: AAPL, /ZQU25, MSFT were added to HVC."),
            vec!["AAPL", "MSFT"]
        );
        assert!(symbols("Alert: New symbol: /ZQU25, /ZZU25 were added to HVC.").is_empty());
    }

    #[test]
    fn watchlist_phrase_is_case_insensitive() {
        assert_eq!(symbols("SYMBOLS: xyz, pqr WAS ADDED"), vec!["PQR", "XYZ"]);
        assert_eq!(
            symbols("symbols: ABC, DEF, GHI were added"),
            vec!["ABC", "DEF", "GHI"]
        );
    }

    #[test]
    fn class_suffix_survives_and_sentence_dots_do_not() {
        assert_eq!(symbols("Watch BRK.B today"), vec!["BRK.B"]);
        assert_eq!(symbols("Breakout on AMD."), vec!["AMD"]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let subject = "Alert: New symbols: FCX, ZVRA were added to HVC.";
        assert_eq!(extract_tickers(subject), extract_tickers(subject));
    }

    #[test]
    fn symbol_parsing_rejects_bad_shapes() {
        assert!("AAPL".parse::<TickerSymbol>().is_ok());
        assert!("TOOLONG".parse::<TickerSymbol>().is_err());
        assert!("aapl".parse::<TickerSymbol>().is_err());
        assert!("A/B".parse::<TickerSymbol>().is_err());
        assert!("".parse::<TickerSymbol>().is_err());
        assert!("1234".parse::<TickerSymbol>().is_err());
    }

    #[test]
    fn serde_normalizes_case() {
        let symbol: TickerSymbol = serde_json::from_str("\" msft \"").unwrap();
        assert_eq!(symbol.as_str(), "MSFT");
        assert_eq!(serde_json::to_string(&symbol).unwrap(), "\"MSFT\"");
    }

    #[test]
    fn logo_url_uses_lowercase_symbol() {
        let symbol: TickerSymbol = "AAPL".parse().unwrap();
        assert_eq!(
            logo_url_for(&symbol),
            "https://static.stocktitan.net/company-logo/aapl.webp"
        );
    }
}
