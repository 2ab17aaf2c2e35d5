//! In-memory ledger of delivered weekly and monthly alerts.
//!
//! Weekly and monthly scans repeat the same symbol every day of their period.
//! The ledger remembers the exchange date of the last delivered alert per
//! `(symbol, timeframe)` and answers whether a new one falls in a later period:
//!
//! - `AlertLedger::should_alert`: daily alerts always pass; weekly alerts pass
//!   once per Monday-based week; monthly alerts once per calendar month.
//! - `AlertLedger::record`: remember a delivery. Daily alerts are not recorded.
//!
//! The ledger is not synchronized and lives as long as the process; a restart
//! forgets it.
use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use hvcwatch_common::{TickerSymbol, Timeframe};

/// Last delivery date per symbol and timeframe.
#[derive(Debug, Default)]
pub struct AlertLedger {
    delivered: HashMap<(TickerSymbol, Timeframe), NaiveDate>,
}

impl AlertLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an alert for `symbol` on exchange date `date` is due.
    pub fn should_alert(&self, symbol: &TickerSymbol, timeframe: Timeframe, date: NaiveDate) -> bool {
        let Some(last) = self.delivered.get(&(symbol.clone(), timeframe)) else {
            return true;
        };
        match timeframe {
            Timeframe::Daily => true,
            Timeframe::Weekly => week_monday(*last) != week_monday(date),
            Timeframe::Monthly => (last.year(), last.month()) != (date.year(), date.month()),
        }
    }

    /// Remembers a delivery for `symbol` on `date`.
    pub fn record(&mut self, symbol: &TickerSymbol, timeframe: Timeframe, date: NaiveDate) {
        if timeframe == Timeframe::Daily {
            return;
        }
        self.delivered.insert((symbol.clone(), timeframe), date);
    }

    /// Number of remembered `(symbol, timeframe)` pairs.
    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}

/// Monday starting the week that contains `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn aapl() -> TickerSymbol {
        "AAPL".parse().unwrap()
    }

    #[test]
    fn daily_alerts_are_never_suppressed() {
        let mut ledger = AlertLedger::new();
        ledger.record(&aapl(), Timeframe::Daily, date(2024, 6, 3));
        assert!(ledger.should_alert(&aapl(), Timeframe::Daily, date(2024, 6, 3)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn weekly_alert_once_per_week() {
        let mut ledger = AlertLedger::new();
        assert!(ledger.should_alert(&aapl(), Timeframe::Weekly, date(2024, 6, 4)));
        ledger.record(&aapl(), Timeframe::Weekly, date(2024, 6, 4));

        assert!(!ledger.should_alert(&aapl(), Timeframe::Weekly, date(2024, 6, 7)));
        assert!(ledger.should_alert(&aapl(), Timeframe::Weekly, date(2024, 6, 10)));
    }

    #[test]
    fn weekly_period_crosses_month_boundary() {
        let mut ledger = AlertLedger::new();
        ledger.record(&aapl(), Timeframe::Weekly, date(2024, 7, 29));
        assert!(!ledger.should_alert(&aapl(), Timeframe::Weekly, date(2024, 8, 2)));
    }

    #[test]
    fn monthly_alert_once_per_month() {
        let mut ledger = AlertLedger::new();
        ledger.record(&aapl(), Timeframe::Monthly, date(2024, 6, 3));
        assert!(!ledger.should_alert(&aapl(), Timeframe::Monthly, date(2024, 6, 28)));
        assert!(ledger.should_alert(&aapl(), Timeframe::Monthly, date(2024, 7, 1)));
        assert!(ledger.should_alert(&aapl(), Timeframe::Monthly, date(2025, 6, 3)));
    }

    #[test]
    fn symbols_and_timeframes_are_tracked_separately() {
        let mut ledger = AlertLedger::new();
        ledger.record(&aapl(), Timeframe::Weekly, date(2024, 6, 3));
        assert!(ledger.should_alert(&"MSFT".parse().unwrap(), Timeframe::Weekly, date(2024, 6, 3)));
        assert!(ledger.should_alert(&aapl(), Timeframe::Monthly, date(2024, 6, 3)));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn monday_of_week() {
        assert_eq!(week_monday(date(2024, 6, 9)), date(2024, 6, 3));
        assert_eq!(week_monday(date(2024, 6, 3)), date(2024, 6, 3));
    }
}
