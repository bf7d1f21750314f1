// src/domain/parse.rs

//! Text-to-number helpers for the loosely formatted fields that portals
//! publish ("KSh 12,500,000", "3 Bedrooms", "1,200 m²", "shared").

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static BEDROOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*[- ]?\s*bed(room)?").unwrap());
static FIRST_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)?").unwrap());
static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(\.\d+)?").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// NBSP to space, whitespace runs collapsed, trimmed.
pub fn clean_text(s: &str) -> String {
    WHITESPACE_RE
        .replace_all(&s.replace('\u{a0}', " "), " ")
        .trim()
        .to_string()
}

/// Digits only. `"KSh 12,500,000"` -> `12500000`.
pub fn extract_price(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Bedroom count from a title or URL slug, e.g. `2-bedroom apartment`,
/// `4-bedroom-apartment-flat-for-sale`, `3 Bed House`.
pub fn extract_bedrooms(text: &str) -> Option<i64> {
    let lower = text.to_lowercase();
    BEDROOMS_RE
        .captures(&lower)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// A bare number wins; otherwise the first number in the text.
pub fn parse_bedrooms(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(n) = t.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    FIRST_NUMBER_RE
        .find(t)
        .and_then(|m| m.as_str().parse().ok())
}

/// First number in the text; `"shared"` counts as one.
pub fn parse_bathrooms(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    if let Some(m) = FIRST_NUMBER_RE.find(&lower) {
        return m.as_str().parse().ok();
    }
    if lower.contains("shared") {
        return Some(1.0);
    }
    None
}

/// Floor area in square metres, thousands separators dropped.
pub fn parse_size(text: &str) -> Option<f64> {
    SIZE_RE
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Splits an amenities cell on `,` `;` `|` or `/`. Case-insensitive
/// duplicates keep their first spelling.
pub fn parse_amenities(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split([',', ';', '|', '/'])
        .map(clean_text)
        .filter(|a| !a.is_empty())
        .filter(|a| seen.insert(a.to_lowercase()))
        .collect()
}

pub fn bedroom_label(bedrooms: Option<f64>) -> String {
    match bedrooms {
        Some(n) if n > 0.0 => format!("{} Bedrooms", n as i64),
        _ => "Unknown".to_string(),
    }
}

pub fn price_per_bedroom(price: f64, bedrooms: Option<f64>) -> Option<f64> {
    match bedrooms {
        Some(b) if b > 0.0 => Some(price / b),
        _ => None,
    }
}

/// `scraped_at` is an ISO timestamp, with or without offset, or a bare date.
pub fn parse_scraped_at(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn parse_scraped_date(s: &str) -> Option<NaiveDate> {
    parse_scraped_at(s).map(|dt| dt.date())
}
