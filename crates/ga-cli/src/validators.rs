//! Input checks run before any remote call.

use chrono_tz::Tz;
use url::Url;

use crate::error::{CliError, CliResult};

fn numeric<'a>(value: &'a str, what: &str) -> CliResult<&'a str> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(value)
    } else {
        Err(CliError::validation(format!("{what} must be numeric")))
    }
}

pub fn account_id(value: &str) -> CliResult<&str> {
    numeric(value, "Account ID")
}

pub fn property_id(value: &str) -> CliResult<&str> {
    numeric(value, "Property ID")
}

pub fn stream_id(value: &str) -> CliResult<&str> {
    numeric(value, "Stream ID")
}

/// Website URL for a web data stream
pub fn url(value: &str) -> CliResult<&str> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(CliError::validation(
            "URL must start with http:// or https://",
        ));
    }
    match Url::parse(value) {
        Ok(parsed) if parsed.host_str().is_some_and(|h| !h.is_empty()) => Ok(value),
        Ok(_) => Err(CliError::validation(format!("Invalid URL: {value}"))),
        Err(err) => Err(CliError::validation(format!("Invalid URL '{value}': {err}"))),
    }
}

/// IANA timezone name, e.g. `America/Los_Angeles`
pub fn timezone(value: &str) -> CliResult<&str> {
    value
        .parse::<Tz>()
        .map(|_| value)
        .map_err(|_| CliError::validation(format!("Invalid timezone: {value}")))
}

/// ISO 4217 style code: three uppercase letters
pub fn currency(value: &str) -> CliResult<&str> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(value)
    } else {
        Err(CliError::validation(
            "Currency must be 3-letter code (e.g., USD)",
        ))
    }
}
