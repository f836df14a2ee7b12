use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate};

/// Parses a feed date token into a calendar date.
///
/// The feed encodes dates as `YYYYMMDD`, sometimes followed by non-date
/// padding digits (e.g. `202406010000`). The first eight characters carry
/// the date; anything after them is discarded.
pub fn parse_date_token(token: &str) -> Result<NaiveDate> {
    let trimmed = token.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() < 8 || !bytes[..8].iter().all(u8::is_ascii_digit) {
        bail!("invalid date token {token:?} (expected at least 8 digits YYYYMMDD)");
    }
    let ymd = &trimmed[..8];

    let year: i32 = ymd[..4].parse()?;
    let month: u32 = ymd[4..6].parse()?;
    let day: u32 = ymd[6..8].parse()?;

    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("date token {token:?} is not a valid calendar date"))
}

/// A trailing, inclusive calendar-day range ending at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// Builds the window covering the past `days` days up to and including
    /// `today`.
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        Self {
            start: today - Duration::days(days),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
