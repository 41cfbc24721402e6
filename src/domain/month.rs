//! Month keys (`YYYY-MM`) and their display labels (`March 2025`).
//!
//! "Today" is always decided in India Standard Time, so a request made at
//! 19:00 UTC on the last day of a month already belongs to the next month.

use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sentinel accepted by every month filter.
pub const ALL_MONTHS: &str = "all";

const ALL_MONTHS_LABEL: &str = "All Months";

/// UTC+05:30, no daylight saving.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Current month plus this many previous months are offered in dropdowns.
const PREVIOUS_MONTHS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthOption {
    #[schema(example = "2025-03")]
    pub value: String,
    #[schema(example = "March 2025")]
    pub label: String,
}

/// First day of the month named by a strict `YYYY-MM` key.
pub fn parse_month_key(key: &str) -> Option<NaiveDate> {
    let bytes = key.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d").ok()
}

fn key_of(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn label_of(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// `"2025-03"` -> `"March 2025"`.
pub fn month_label(key: &str) -> Option<String> {
    parse_month_key(key).map(label_of)
}

/// Accepts either a key or a display label and returns the canonical key.
pub fn normalize_month(input: &str) -> Option<String> {
    let input = input.trim();

    if let Some(date) = parse_month_key(input) {
        return Some(key_of(date));
    }

    let words: Vec<&str> = input.split_whitespace().collect();
    if words.len() != 2 {
        return None;
    }
    NaiveDate::parse_from_str(&format!("1 {} {}", words[0], words[1]), "%d %B %Y")
        .ok()
        .map(key_of)
}

pub fn current_month_key(now: DateTime<Utc>) -> String {
    let today = match FixedOffset::east_opt(IST_OFFSET_SECS) {
        Some(ist) => now.with_timezone(&ist).date_naive(),
        None => now.date_naive(),
    };
    key_of(today)
}

/// `"all"` followed by the current IST month and the four before it, newest first.
pub fn month_options(now: DateTime<Utc>) -> Vec<MonthOption> {
    let mut options = vec![MonthOption {
        value: ALL_MONTHS.to_string(),
        label: ALL_MONTHS_LABEL.to_string(),
    }];

    let Some(current) = parse_month_key(&current_month_key(now)) else {
        return options;
    };

    options.extend((0..=PREVIOUS_MONTHS).filter_map(|back| {
        current
            .checked_sub_months(Months::new(back))
            .map(|date| MonthOption {
                value: key_of(date),
                label: label_of(date),
            })
    }));

    options
}

/// A `?month=` query value after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthFilter {
    All,
    Month(String),
}

impl MonthFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw.map(str::trim) {
            None | Some("") => Ok(MonthFilter::All),
            Some(value) if value.eq_ignore_ascii_case(ALL_MONTHS) => Ok(MonthFilter::All),
            Some(value) => normalize_month(value)
                .map(MonthFilter::Month)
                .ok_or_else(|| format!("Invalid month: {value}")),
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            MonthFilter::All => None,
            MonthFilter::Month(key) => Some(key),
        }
    }

    pub fn matches(&self, month: &str) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(key) => key == month,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn label_and_key_convert_both_ways() {
        assert_eq!(month_label("2025-03").as_deref(), Some("March 2025"));
        assert_eq!(normalize_month("March 2025").as_deref(), Some("2025-03"));
        assert_eq!(normalize_month("  december 2024 ").as_deref(), Some("2024-12"));
        assert_eq!(normalize_month("2025-11").as_deref(), Some("2025-11"));
    }

    #[test]
    fn rejects_malformed_months() {
        assert_eq!(parse_month_key("2025-3"), None);
        assert_eq!(parse_month_key("2025-13"), None);
        assert_eq!(normalize_month("Marchember 2025"), None);
        assert_eq!(normalize_month("March"), None);
        assert_eq!(month_label("all"), None);
    }

    #[test]
    fn current_month_uses_ist() {
        // 18:00 UTC is 23:30 IST, still March
        assert_eq!(current_month_key(utc(2025, 3, 31, 18, 0)), "2025-03");
        // 19:00 UTC is 00:30 IST on April 1st
        assert_eq!(current_month_key(utc(2025, 3, 31, 19, 0)), "2025-04");
    }

    #[test]
    fn options_cover_five_months_and_all() {
        let options = month_options(utc(2025, 1, 15, 6, 0));
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();

        assert_eq!(
            values,
            vec!["all", "2025-01", "2024-12", "2024-11", "2024-10", "2024-09"]
        );
        assert_eq!(options[0].label, "All Months");
        assert_eq!(options[2].label, "December 2024");
    }

    #[test]
    fn options_round_trip_through_labels() {
        for option in month_options(utc(2025, 3, 2, 0, 0)).iter().skip(1) {
            let label = month_label(&option.value).unwrap();
            assert_eq!(label, option.label);
            assert_eq!(normalize_month(&label).unwrap(), option.value);
        }
    }

    #[test]
    fn filter_parsing() {
        assert_eq!(MonthFilter::parse(None), Ok(MonthFilter::All));
        assert_eq!(MonthFilter::parse(Some("all")), Ok(MonthFilter::All));
        assert_eq!(MonthFilter::parse(Some("")), Ok(MonthFilter::All));
        assert_eq!(
            MonthFilter::parse(Some("January 2025")),
            Ok(MonthFilter::Month("2025-01".to_string()))
        );
        assert!(MonthFilter::parse(Some("2025/01")).is_err());

        let filter = MonthFilter::parse(Some("2025-01")).unwrap();
        assert!(filter.matches("2025-01"));
        assert!(!filter.matches("2025-02"));
        assert!(MonthFilter::All.matches("1999-12"));
    }
}
