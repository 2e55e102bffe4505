use std::path::PathBuf;

/// Placeholder shown for values the API did not return
pub const NOT_AVAILABLE: &str = "N/A";

/// Format an optional value, returning `N/A` if None or empty
pub fn or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Format an RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS`.
/// Fractional seconds and the zone are dropped; unparsable input is returned as-is.
pub fn format_timestamp(value: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => value.to_string(),
    }
}

/// Format an optional timestamp, `N/A` when absent
pub fn format_optional_timestamp(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => format_timestamp(v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Turn a record key into a column header: `create_time` -> `Create Time`
pub fn header_label(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(input: &str) -> PathBuf {
    let trimmed = input.trim();
    if trimmed == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(trimmed)
}
