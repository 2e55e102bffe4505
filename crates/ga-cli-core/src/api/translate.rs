//! User-facing messages for remote failures.

use std::error::Error;

use super::{ApiError, ErrorKind};

/// Command users run to (re)configure credentials
pub const INIT_COMMAND: &str = "ga-cli config init";

/// Fixed sentence shown for each failure kind
pub fn message_for(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "Resource not found. Please check the ID and try again.",
        ErrorKind::PermissionDenied => {
            "Permission denied. Ensure your service account has the required permissions."
        }
        ErrorKind::InvalidArgument => "Invalid argument provided. Please check your input.",
        ErrorKind::Unauthenticated => {
            "Authentication failed. Run \"ga-cli config init\" to configure credentials."
        }
        ErrorKind::ResourceExhausted => "Rate limit exceeded. Please wait a moment and try again.",
        ErrorKind::Internal => "Internal server error. Please try again later.",
        ErrorKind::Unavailable => "Service temporarily unavailable. Please try again later.",
        ErrorKind::DeadlineExceeded => "Request timeout. Please try again.",
    }
}

/// Friendly message for an API error
pub fn friendly_message(err: &ApiError) -> String {
    match err.kind() {
        Some(kind) => message_for(kind).to_string(),
        None => format!("An error occurred: {}", err),
    }
}

/// Friendly message for any error; recognised API failures get their fixed
/// sentence, everything else is reported verbatim.
pub fn translate(err: &(dyn Error + 'static)) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) => friendly_message(api),
        None => format!("An error occurred: {}", err),
    }
}
