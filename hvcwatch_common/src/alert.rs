//! Alert and enrichment records.
//!
//! An `Alert` is created once per extracted symbol of an inbound message and never
//! mutated. An `EnrichedTicker` is produced once per admitted alert by the
//! enrichment provider and is read-only from then on; every delivery channel for
//! that alert borrows the same value.
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::tickers::TickerSymbol;

/// Alert cadence announced by the subject line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Every alert is delivered.
    #[default]
    Daily,
    /// At most one alert per symbol per Monday-based week.
    Weekly,
    /// At most one alert per symbol per calendar month.
    Monthly,
}

impl Timeframe {
    /// Detects the cadence from `weekly` / `monthly` keywords; anything else is daily.
    pub fn from_subject(subject: &str) -> Self {
        let lower = subject.to_ascii_lowercase();
        if lower.contains("monthly") {
            Timeframe::Monthly
        } else if lower.contains("weekly") {
            Timeframe::Weekly
        } else {
            Timeframe::Daily
        }
    }
}

/// One actionable alert for a single symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Symbol extracted from the subject.
    pub symbol: TickerSymbol,
    /// Arrival instant, in whatever zone the mailbox reported it.
    pub observed_at: DateTime<FixedOffset>,
    /// Subject line the symbol was extracted from.
    pub raw_subject: String,
    /// Cadence detected from the subject.
    pub timeframe: Timeframe,
}

impl Alert {
    /// Creates an alert, detecting the timeframe from `raw_subject`.
    pub fn new(symbol: TickerSymbol, observed_at: DateTime<FixedOffset>, raw_subject: &str) -> Self {
        Alert {
            symbol,
            observed_at,
            raw_subject: raw_subject.to_string(),
            timeframe: Timeframe::from_subject(raw_subject),
        }
    }
}

/// Market and company data for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTicker {
    /// Symbol the record describes.
    pub symbol: TickerSymbol,
    /// Company name (e.g. `Apple Inc.`).
    pub company_name: String,
    /// Logo image URL; empty when the provider has none.
    #[serde(default)]
    pub logo_url: String,
    /// Latest close or last trade price.
    pub price: f64,
    /// Volume of the current session.
    pub current_volume: u64,
    /// 20-day simple moving average of volume. `None` with fewer than 20 sessions
    /// of history, which is not the same as an average of zero.
    #[serde(default)]
    pub volume_20d_average: Option<f64>,
}

impl EnrichedTicker {
    /// Current volume relative to the 20-day average, when there is a usable average.
    pub fn volume_ratio(&self) -> Option<f64> {
        match self.volume_20d_average {
            Some(average) if average > 0.0 => Some(self.current_volume as f64 / average),
            _ => None,
        }
    }
}
