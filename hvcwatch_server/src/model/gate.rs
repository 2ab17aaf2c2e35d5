//! Market-hours admission gate.
//!
//! An alert is still actionable when it arrives within the exchange session of
//! its local trading day, widened by a fixed buffer on both sides. Non-trading
//! days are rejected outright; the buffer never reaches into them.
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::model::calendar::TradingCalendar;

/// Default tolerance around the open and close, in minutes.
pub const DEFAULT_WINDOW_BUFFER_MINUTES: i64 = 60;

/// Decides whether an alert falls inside `[open - buffer, close + buffer]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketWindowGate {
    buffer: TimeDelta,
}

impl Default for MarketWindowGate {
    fn default() -> Self {
        MarketWindowGate::new(TimeDelta::minutes(DEFAULT_WINDOW_BUFFER_MINUTES))
    }
}

impl MarketWindowGate {
    /// Gate with a custom tolerance.
    pub fn new(buffer: TimeDelta) -> Self {
        MarketWindowGate { buffer }
    }

    /// Tolerance applied on both sides of the session.
    pub fn buffer(&self) -> TimeDelta {
        self.buffer
    }

    /// Admits `observed_at` (any zone) against `calendar`. Bounds are inclusive.
    pub fn admit<Z: TimeZone>(&self, observed_at: &DateTime<Z>, calendar: &dyn TradingCalendar) -> bool {
        let local_date = observed_at.with_timezone(&calendar.timezone()).date_naive();
        let Some(session) = calendar.session(local_date) else {
            return false;
        };
        let at = observed_at.with_timezone(&Utc);
        at >= session.open - self.buffer && at <= session.close + self.buffer
    }
}
