//! Lenient query string normalization.
//!
//! List endpoints never reject a request because of a malformed query
//! parameter: a value that does not parse simply leaves its filter unapplied
//! or falls back to the default. Repeated keys (`?page=2&page=5`) keep every
//! value and the parsers look at the first one.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use chronocap_core::defaults::{DEFAULT_PAGE, DEFAULT_PER_PAGE};
use chronocap_core::{
    AccountType, CapsuleFilter, CapsuleQuery, NewsFilter, NewsQuery, NewsSortField, NewsType,
    SortDirection, SortSpec,
};

/// One query parameter as it arrived: a single value or a repeated key.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Single(String),
    Many(Vec<String>),
}

impl RawValue {
    /// The value parsers look at.
    pub fn first(&self) -> Option<&str> {
        match self {
            RawValue::Single(s) => Some(s.as_str()),
            RawValue::Many(values) => values.first().map(String::as_str),
        }
    }

    fn push(self, value: String) -> Self {
        match self {
            RawValue::Single(first) => RawValue::Many(vec![first, value]),
            RawValue::Many(mut values) => {
                values.push(value);
                RawValue::Many(values)
            }
        }
    }
}

/// Decoded query string keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    values: HashMap<String, RawValue>,
}

impl QueryParams {
    /// Decode a raw (still percent-encoded) query string.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut values: HashMap<String, RawValue> = HashMap::new();
        let Some(raw) = raw else {
            return Self { values };
        };
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let key = key.into_owned();
            let value = value.into_owned();
            let entry = match values.remove(&key) {
                Some(existing) => existing.push(value),
                None => RawValue::Single(value),
            };
            values.insert(key, entry);
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }
}

fn first_trimmed(value: Option<&RawValue>) -> Option<&str> {
    value
        .and_then(RawValue::first)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn finite_number(value: Option<&RawValue>) -> Option<f64> {
    first_trimmed(value)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// A whole number of at least 1, or `fallback`.
///
/// Fractional values are truncated; anything below 1 after truncation falls
/// back.
pub fn parse_positive_integer(value: Option<&RawValue>, fallback: u64) -> u64 {
    match finite_number(value) {
        Some(n) if n >= 1.0 => {
            let whole = n.trunc();
            if whole >= u64::MAX as f64 {
                u64::MAX
            } else {
                whole as u64
            }
        }
        _ => fallback,
    }
}

/// The first string value, if any.
pub fn parse_string(value: Option<&RawValue>) -> Option<String> {
    value
        .and_then(RawValue::first)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Any finite number, negative included.
pub fn parse_float(value: Option<&RawValue>) -> Option<f64> {
    finite_number(value)
}

/// A finite number strictly greater than zero.
pub fn parse_positive_float(value: Option<&RawValue>) -> Option<f64> {
    finite_number(value).filter(|n| *n > 0.0)
}

/// RFC 3339, a naive ISO 8601 date-time (taken as UTC) or a bare date
/// (midnight UTC).
pub fn parse_date(value: Option<&RawValue>) -> Option<DateTime<Utc>> {
    let s = first_trimmed(value)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Build a capsule list query from `GET /capsules` parameters.
pub fn capsule_query(params: &QueryParams) -> CapsuleQuery {
    let filter = CapsuleFilter {
        user_id: parse_string(params.get("userId")),
        country: parse_string(params.get("country")),
        city: parse_string(params.get("city")),
        available_after: parse_date(params.get("availableAfter")),
        available_before: parse_date(params.get("availableBefore")),
        lat: parse_float(params.get("lat")),
        lon: parse_float(params.get("lon")),
        distance: parse_positive_float(params.get("distance")),
    };
    let sort = SortSpec::resolve(
        parse_string(params.get("sortField")).as_deref(),
        parse_string(params.get("sortOrder")).as_deref(),
        filter.geo().is_some(),
    );

    CapsuleQuery {
        page: parse_positive_integer(params.get("page"), DEFAULT_PAGE),
        per_page: parse_positive_integer(params.get("perPage"), DEFAULT_PER_PAGE),
        filter,
        sort,
    }
}

/// Build a news list query from `GET /news` parameters.
pub fn news_query(params: &QueryParams) -> NewsQueryParse {
    let mut unsatisfiable = false;

    let type_account = parse_string(params.get("typeAccount")).and_then(|raw| {
        let parsed = raw.parse::<AccountType>().ok();
        unsatisfiable |= parsed.is_none();
        parsed
    });
    let news_type = parse_string(params.get("type")).and_then(|raw| {
        let parsed = raw.parse::<NewsType>().ok();
        unsatisfiable |= parsed.is_none();
        parsed
    });

    let query = NewsQuery {
        filter: NewsFilter {
            topic: parse_string(params.get("topic")),
            type_account,
            user_id: parse_string(params.get("userId")),
            news_type,
        },
        page: parse_positive_integer(params.get("page"), DEFAULT_PAGE),
        per_page: parse_positive_integer(params.get("perPage"), DEFAULT_PER_PAGE),
        sort_field: parse_string(params.get("sortField"))
            .as_deref()
            .and_then(NewsSortField::parse)
            .unwrap_or(NewsSortField::CreatedAt),
        sort_direction: SortDirection::from_token(parse_string(params.get("sortOrder")).as_deref()),
    };

    NewsQueryParse {
        query,
        unsatisfiable,
    }
}

/// Parsed news list parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsQueryParse {
    pub query: NewsQuery,
    /// An enum filter held an unknown value, so nothing can match.
    pub unsatisfiable: bool,
}
