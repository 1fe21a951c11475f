//! String formats implied by the `email`, `uri`, `uuid`, `date` and `datetime` types.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("invalid email regex")
});

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}$")
        .expect("invalid uuid regex")
});

pub fn is_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Absolute URI with a scheme.
pub fn is_uri(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

pub fn is_uuid(value: &str) -> bool {
    UUID_PATTERN.is_match(value)
}

/// Full date, `YYYY-MM-DD`.
pub fn is_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// RFC 3339 date-time with offset.
pub fn is_datetime(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}
