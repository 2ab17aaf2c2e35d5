//! Exchange trading calendar.
//!
//! `TradingCalendar` is the read-only source of truth the market window gate
//! consults: the exchange time zone and, per local date, the scheduled session or
//! `None` for weekends and holidays.
//!
//! `NyseCalendar` encodes the New York Stock Exchange rules:
//! - regular session 09:30-16:00 America/New_York;
//! - full holidays: New Year's Day, Martin Luther King Jr. Day, Washington's
//!   Birthday, Good Friday, Memorial Day, Juneteenth (from 2022), Independence Day,
//!   Labor Day, Thanksgiving and Christmas. Saturday holidays are observed on the
//!   Friday before (except New Year's Day, which is not observed), Sunday holidays
//!   on the Monday after;
//! - 13:00 early close on July 3, the day after Thanksgiving and Christmas Eve
//!   whenever those are trading days.
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Scheduled open and close of one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingSession {
    /// Opening bell.
    pub open: DateTime<Utc>,
    /// Closing bell, earlier than usual on early-close days.
    pub close: DateTime<Utc>,
}

/// Exchange calendar snapshot. Implementations must be pure reads.
pub trait TradingCalendar: Send + Sync {
    /// Time zone the exchange keeps its calendar in.
    fn timezone(&self) -> Tz;

    /// Session for the exchange-local `date`, or `None` on non-trading days.
    fn session(&self, date: NaiveDate) -> Option<TradingSession>;
}

/// New York Stock Exchange calendar computed from the holiday rules.
#[derive(Debug, Clone, Copy)]
pub struct NyseCalendar {
    open: NaiveTime,
    close: NaiveTime,
    early_close: NaiveTime,
}

impl Default for NyseCalendar {
    fn default() -> Self {
        NyseCalendar {
            open: hm(9, 30),
            close: hm(16, 0),
            early_close: hm(13, 0),
        }
    }
}

impl NyseCalendar {
    /// Whether `date` is a full-day NYSE holiday (weekends are not holidays).
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        let year = date.year();
        if date == new_years_observed(year) {
            return true;
        }
        let mut holidays = vec![
            nth_weekday(year, 1, Weekday::Mon, 3),
            nth_weekday(year, 2, Weekday::Mon, 3),
            good_friday(year),
            last_weekday(year, 5, Weekday::Mon),
            observed(ymd(year, 7, 4)),
            nth_weekday(year, 9, Weekday::Mon, 1),
            thanksgiving(year),
            observed(ymd(year, 12, 25)),
        ];
        if year >= 2022 {
            holidays.push(observed(ymd(year, 6, 19)));
        }
        holidays.contains(&date)
    }

    /// Whether `date` is a trading day that closes at 13:00.
    pub fn is_early_close(&self, date: NaiveDate) -> bool {
        if !self.is_trading_day(date) {
            return false;
        }
        let year = date.year();
        let day_after_thanksgiving = thanksgiving(year) + Days::new(1);
        date == ymd(year, 7, 3) || date == day_after_thanksgiving || date == ymd(year, 12, 24)
    }

    /// Weekday that is not a holiday.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.is_holiday(date)
    }
}

impl TradingCalendar for NyseCalendar {
    fn timezone(&self) -> Tz {
        chrono_tz::America::New_York
    }

    fn session(&self, date: NaiveDate) -> Option<TradingSession> {
        if !self.is_trading_day(date) {
            return None;
        }
        let close = if self.is_early_close(date) {
            self.early_close
        } else {
            self.close
        };
        let zone = self.timezone();
        Some(TradingSession {
            open: zone
                .from_local_datetime(&date.and_time(self.open))
                .single()?
                .with_timezone(&Utc),
            close: zone
                .from_local_datetime(&date.and_time(close))
                .single()?
                .with_timezone(&Utc),
        })
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Builds a date that is valid by construction (fixed month/day pairs).
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> NaiveDate {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n).unwrap_or(NaiveDate::MIN)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    nth_weekday(year, month, weekday, 5)
        .max(nth_weekday(year, month, weekday, 4))
}

fn thanksgiving(year: i32) -> NaiveDate {
    nth_weekday(year, 11, Weekday::Thu, 4)
}

/// Saturday holidays move to Friday, Sunday holidays to Monday.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Days::new(1),
        Weekday::Sun => date + Days::new(1),
        _ => date,
    }
}

/// New Year's Day is not moved back into the previous year.
fn new_years_observed(year: i32) -> NaiveDate {
    let day = ymd(year, 1, 1);
    match day.weekday() {
        Weekday::Sun => day + Days::new(1),
        _ => day,
    }
}

/// Anonymous Gregorian computus.
fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, month as u32, day as u32)
}

fn good_friday(year: i32) -> NaiveDate {
    easter_sunday(year) - Days::new(2)
}
