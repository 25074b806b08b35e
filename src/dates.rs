use std::sync::OnceLock;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;

use crate::columns;
use crate::config;
use crate::models::{CellValue, DateRange, DateWindow, Row};

const MS_PER_DAY: f64 = 86_400_000.0;
const MAX_TIMESTAMP_MS: f64 = 8.64e15;
const DATE_SAMPLE_ROWS: usize = 5;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Spreadsheet day zero (1899-12-30, which absorbs the 1900 leap-year bug).
pub fn serial_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Normalizes a raw cell into a timestamp; `None` means unparseable.
pub fn parse_cell_date(value: Option<&CellValue>) -> Option<NaiveDateTime> {
    let value = value?;

    if let CellValue::Number(serial) = value {
        if let Some(date) = from_serial(*serial) {
            return Some(date);
        }
    }

    let text = value.to_string();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    parse_generic(text).or_else(|| parse_day_month_year(text))
}

fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    let ms = serial * MS_PER_DAY;
    if !ms.is_finite() || ms.abs() > MAX_TIMESTAMP_MS {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(ms as i64)?;
    serial_epoch().checked_add_signed(delta)
}

fn parse_generic(text: &str) -> Option<NaiveDateTime> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.naive_utc());
    }
    if let Ok(instant) = DateTime::parse_from_rfc2822(text) {
        return Some(instant.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// `D/M/YYYY` or `D-M-YYYY`; out-of-range days and months roll over.
fn parse_day_month_year(text: &str) -> Option<NaiveDateTime> {
    static DMY: OnceLock<Regex> = OnceLock::new();
    let re = DMY.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})$").expect("day/month/year regex")
    });
    let caps = re.captures(text)?;
    let day: i64 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;

    let january = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let first_of_month = if month == 0 {
        january.checked_sub_months(Months::new(1))?
    } else {
        january.checked_add_months(Months::new(month - 1))?
    };
    first_of_month
        .checked_add_signed(TimeDelta::try_days(day - 1)?)?
        .and_hms_opt(0, 0, 0)
}

/// Picks the date column: the first keyword candidate that parses in the
/// first few rows, else the first candidate.
pub fn find_date_column(rows: &[Row]) -> Option<String> {
    let candidates = columns::find_columns(&columns::sample_columns(rows), config::DATE_KEYWORDS);

    let validated = candidates.iter().find(|column| {
        rows.iter()
            .take(DATE_SAMPLE_ROWS)
            .any(|row| parse_cell_date(row.get(column)).is_some())
    });

    match validated.or_else(|| candidates.first()) {
        Some(column) => {
            log::info!("date column: {column}");
            Some(column.clone())
        }
        None => {
            log::warn!("no date column found; date filtering disabled for this dataset");
            None
        }
    }
}

pub fn derive_date_range(rows: &[Row]) -> DateRange {
    let column = find_date_column(rows);
    let mut min: Option<NaiveDateTime> = None;
    let mut max: Option<NaiveDateTime> = None;

    if let Some(column) = column.as_deref() {
        for date in rows.iter().filter_map(|row| parse_cell_date(row.get(column))) {
            min = Some(min.map_or(date, |current| current.min(date)));
            max = Some(max.map_or(date, |current| current.max(date)));
        }
    }

    DateRange { column, min, max }
}

pub fn end_of_day(end: NaiveDateTime) -> NaiveDateTime {
    end.date()
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or(end)
}

/// Keeps rows inside the inclusive window. Rows whose date cannot be
/// parsed are always kept.
pub fn filter_by_date_range(rows: &[Row], column: Option<&str>, window: DateWindow) -> Vec<Row> {
    let Some(column) = column else {
        return rows.to_vec();
    };
    if window.start.is_none() && window.end.is_none() {
        return rows.to_vec();
    }

    let end = window.end.map(end_of_day);
    rows.iter()
        .filter(|row| match parse_cell_date(row.get(column)) {
            None => true,
            Some(date) => {
                window.start.map_or(true, |start| date >= start)
                    && end.map_or(true, |end| date <= end)
            }
        })
        .cloned()
        .collect()
}
