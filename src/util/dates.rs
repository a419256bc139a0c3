use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a feed publish date. Accepts RFC 3339, RFC 2822 and a few zone-less ISO forms
/// (read as UTC). Anything else yields `None`.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    NewestFirst,
    OldestFirst,
}

/// Three-way comparison of optional dates. Missing or unparsable dates always sort after
/// valid ones, whichever direction is requested, and compare equal among themselves.
pub fn cmp_pub_dates(
    a: Option<&DateTime<Utc>>,
    b: Option<&DateTime<Utc>>,
    order: DateOrder,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            DateOrder::NewestFirst => b.cmp(a),
            DateOrder::OldestFirst => a.cmp(b),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
