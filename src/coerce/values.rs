//! Per-type cell coercion rules
//!
//! Every rule is total: a malformed cell yields the type's default
//! (null date, `0.0`, empty string) and never an error.

use crate::ingest::RawValue;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

/// `1,234,567` or `-1,234.50`
static GROUPED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("valid regex"));

/// `a/b/yyyy`, `a-b-yyyy`, `a.b.yyyy`
static NUMERIC_DMY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})$").expect("valid regex")
});

/// Year-first layouts, tried on the whole value and on its leading token
const YEAR_FIRST_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const NAMED_MONTH_FORMATS: &[&str] = &["%d %b %Y", "%d-%b-%Y", "%b %d, %Y", "%b %d %Y"];

/// Month spellings mapped to the three-letter English abbreviation chrono expects
const MONTH_NAMES: &[(&str, &str)] = &[
    ("january", "Jan"),
    ("januari", "Jan"),
    ("february", "Feb"),
    ("februari", "Feb"),
    ("peb", "Feb"),
    ("march", "Mar"),
    ("maret", "Mar"),
    ("april", "Apr"),
    ("may", "May"),
    ("mei", "May"),
    ("june", "Jun"),
    ("juni", "Jun"),
    ("july", "Jul"),
    ("juli", "Jul"),
    ("august", "Aug"),
    ("agustus", "Aug"),
    ("agu", "Aug"),
    ("agt", "Aug"),
    ("september", "Sep"),
    ("sept", "Sep"),
    ("october", "Oct"),
    ("oktober", "Oct"),
    ("okt", "Oct"),
    ("november", "Nov"),
    ("nop", "Nov"),
    ("december", "Dec"),
    ("desember", "Dec"),
    ("des", "Dec"),
];

/// Largest spreadsheet serial date (9999-12-31)
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

// ============================================================================
// Number
// ============================================================================

/// Coerce a cell to a number; unparsable or missing becomes `0.0`
pub fn coerce_number(cell: Option<&RawValue>) -> f64 {
    match cell {
        Some(RawValue::Number(n)) if n.is_finite() => *n,
        Some(RawValue::Text(s)) => parse_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse a numeric string, tolerating thousands separators
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = if GROUPED_NUMBER.is_match(trimmed) {
        trimmed.replace(',', "").parse::<f64>()
    } else {
        trimmed.parse::<f64>()
    };

    // "nan" and "inf" parse successfully but are not usable amounts
    parsed.ok().filter(|n| n.is_finite())
}

// ============================================================================
// Text
// ============================================================================

/// Coerce a cell to cleaned text
///
/// Trim, blank out the `nan` marker, drop a trailing `.0`, and upper-case
/// categorical fields.
pub fn coerce_text(cell: Option<&RawValue>, categorical: bool) -> String {
    let raw = match cell {
        Some(RawValue::Text(s)) => s.clone(),
        Some(RawValue::Number(n)) => n.to_string(),
        Some(RawValue::Blank) | None => String::new(),
    };

    let mut text = raw.trim();
    if text.eq_ignore_ascii_case("nan") {
        text = "";
    }
    let text = text.strip_suffix(".0").unwrap_or(text);

    if categorical {
        text.to_uppercase()
    } else {
        text.to_string()
    }
}

// ============================================================================
// Date
// ============================================================================

/// Coerce a cell to a calendar date; unparsable or missing becomes `None`
pub fn coerce_date(cell: Option<&RawValue>, day_first: bool) -> Option<NaiveDate> {
    match cell {
        Some(RawValue::Text(s)) => parse_date(s, day_first),
        Some(RawValue::Number(n)) => from_serial_date(*n),
        Some(RawValue::Blank) | None => None,
    }
}

/// Parse a date string in any of the accepted layouts
pub fn parse_date(value: &str, day_first: bool) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // Compact yyyymmdd
    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(value, "%Y%m%d").ok();
    }

    if let Some(date) = parse_year_first(value) {
        return Some(date);
    }

    if let Some(date) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(date.date());
    }

    if let Some(date) = parse_numeric_dmy(value, day_first) {
        return Some(date);
    }

    if let Some(date) = parse_named_month(value) {
        return Some(date);
    }

    // Leading date token followed by a time we do not recognize
    value
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .filter(|head| head.len() < value.len())
        .and_then(|head| parse_year_first(head).or_else(|| parse_numeric_dmy(head, day_first)))
}

fn parse_year_first(value: &str) -> Option<NaiveDate> {
    YEAR_FIRST_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// `a/b/yyyy`: preferred order first, then the other one
fn parse_numeric_dmy(value: &str, day_first: bool) -> Option<NaiveDate> {
    let caps = NUMERIC_DMY.captures(value)?;
    let a: u32 = caps[1].parse().ok()?;
    let b: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;

    let (first, second) = if day_first { ((b, a), (a, b)) } else { ((a, b), (b, a)) };
    NaiveDate::from_ymd_opt(year, first.0, first.1)
        .or_else(|| NaiveDate::from_ymd_opt(year, second.0, second.1))
}

fn parse_named_month(value: &str) -> Option<NaiveDate> {
    let normalized = normalize_month_names(value);
    NAMED_MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}

/// Replace English/Indonesian month spellings with chrono's abbreviations
fn normalize_month_names(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        if !word.is_empty() {
            let lower = word.to_lowercase();
            match MONTH_NAMES.iter().find(|(name, _)| *name == lower) {
                Some((_, abbrev)) => out.push_str(abbrev),
                None => out.push_str(word),
            }
            word.clear();
        }
    };

    for c in value.chars() {
        if c.is_alphabetic() {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out
}

/// Spreadsheet serial date (1900 date system) to a calendar date
pub fn from_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL_DATE).contains(&serial) {
        return None;
    }
    // Day zero is 1899-12-30, which absorbs the 1900 leap-year quirk
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
