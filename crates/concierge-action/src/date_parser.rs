//! Natural-language date parsing for scheduling.
//!
//! Resolves phrases such as "tomorrow", "next friday", "12/25" or
//! "December 25th, 2026" to a calendar date. Relative phrases are resolved
//! against "today" in the configured time zone.

use chrono::{Datelike, Days, Months, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

// =============================================================================
// Compiled patterns
// =============================================================================

struct DatePatterns {
    today: Regex,
    tomorrow: Regex,
    next_week: Regex,
    next_month: Regex,
    weekdays: Vec<(Weekday, Regex, Regex)>,
    iso: Regex,
    slash: Regex,
    month_day: Regex,
    day_month: Regex,
}

const MONTH_ALTS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

static PATTERNS: LazyLock<DatePatterns> = LazyLock::new(|| {
    let re = |p: &str| Regex::new(p).expect("Invalid date regex");

    let weekdays = [
        (Weekday::Mon, "monday"),
        (Weekday::Tue, "tuesday"),
        (Weekday::Wed, "wednesday"),
        (Weekday::Thu, "thursday"),
        (Weekday::Fri, "friday"),
        (Weekday::Sat, "saturday"),
        (Weekday::Sun, "sunday"),
    ]
    .into_iter()
    .map(|(day, name)| {
        (
            day,
            re(&format!(r"(?i)\bnext\s+{}\b", name)),
            re(&format!(r"(?i)\b{}\b", name)),
        )
    })
    .collect();

    DatePatterns {
        today: re(r"(?i)\btoday\b"),
        tomorrow: re(r"(?i)\btomorrow\b"),
        next_week: re(r"(?i)\bnext\s+week\b"),
        next_month: re(r"(?i)\bnext\s+month\b"),
        weekdays,
        iso: re(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b"),
        slash: re(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b"),
        month_day: re(&format!(
            r"(?i)\b({})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?",
            MONTH_ALTS
        )),
        day_month: re(&format!(
            r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({})\b\.?(?:,?\s+(\d{{4}}))?",
            MONTH_ALTS
        )),
    }
});

/// Date parser bound to a time zone.
#[derive(Debug, Clone, Copy)]
pub struct DateParser {
    tz: Tz,
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Kathmandu)
    }
}

impl DateParser {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Today's date in the parser's time zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// Parse `text` relative to `today`.
    ///
    /// Rules are tried in order and the first match wins: today, tomorrow,
    /// next week, weekdays, next month, then explicit dates.
    pub fn parse(text: &str, today: NaiveDate) -> Option<NaiveDate> {
        let p = &*PATTERNS;

        if p.today.is_match(text) {
            return Some(today);
        }
        if p.tomorrow.is_match(text) {
            return today.checked_add_days(Days::new(1));
        }
        if p.next_week.is_match(text) {
            return today.checked_add_days(Days::new(7));
        }
        for (day, next_re, bare_re) in &p.weekdays {
            if next_re.is_match(text) {
                return Some(next_weekday(today, *day, false));
            }
            if bare_re.is_match(text) {
                return Some(next_weekday(today, *day, true));
            }
        }
        if p.next_month.is_match(text) {
            return today.checked_add_months(Months::new(1));
        }

        parse_explicit(text, today)
    }
}

/// The next `day` after `today`, or `today` itself when `inclusive`.
fn next_weekday(today: NaiveDate, day: Weekday, inclusive: bool) -> NaiveDate {
    let current = today.weekday().num_days_from_monday();
    let target = day.num_days_from_monday();
    let mut ahead = (7 + target - current) % 7;
    if ahead == 0 && !inclusive {
        ahead = 7;
    }
    today + Days::new(ahead as u64)
}

fn parse_explicit(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let p = &*PATTERNS;

    if let Some(caps) = p.iso.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = p.slash.captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|y| expand_year(y.as_str()));
        if let Some(date) = resolve(year, month, day, today) {
            return Some(date);
        }
    }

    if let Some(caps) = p.month_day.captures(text) {
        let month = month_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        if let Some(date) = resolve(year, month, day, today) {
            return Some(date);
        }
    }

    if let Some(caps) = p.day_month.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
        if let Some(date) = resolve(year, month, day, today) {
            return Some(date);
        }
    }

    None
}

/// Build a date; without a year, use the current year and roll past dates
/// into next year.
fn resolve(year: Option<i32>, month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    match year {
        Some(y) => NaiveDate::from_ymd_opt(y, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
            match this_year {
                Some(date) if date >= today => Some(date),
                _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
            }
        }
    }
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(if raw.len() == 2 { 2000 + year } else { year })
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
