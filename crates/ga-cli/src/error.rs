use std::fmt::{self, Display, Formatter};

use ga_cli_core::api::{friendly_message, ApiError, INIT_COMMAND};
use ga_cli_core::auth::AuthError;
use ga_cli_core::config::{ConfigError, ValidationError};

/// Shown when no credential path resolves and discovery finds nothing
pub fn no_credentials_message() -> String {
    format!("No credentials configured. Run '{}' first.", INIT_COMMAND)
}

/// Command failure carrying its exit code.
#[derive(Debug)]
pub enum CliError {
    /// Bad input detected before any remote call (exit 2)
    Validation(String),
    /// Anything that went wrong while doing the work (exit 1)
    Failure(anyhow::Error),
}

pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 1,
        }
    }

    /// Message for the user. Remote failures get their fixed sentence.
    pub fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => match error.downcast_ref::<ApiError>() {
                Some(api) => friendly_message(api),
                None => format!("An error occurred: {error:#}"),
            },
        }
    }

    /// Full error chain for the log file
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::Failure(err.into())
    }
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NoCredentials => Self::Validation(no_credentials_message()),
            other => Self::Failure(other.into()),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Config(config) => Self::Failure(config.into()),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Failure(err.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Failure(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use ga_cli_core::api::ErrorKind;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow::anyhow!("boom")).exit_code(), 1);
    }

    #[test]
    fn test_api_errors_are_translated() {
        let err = CliError::from(ApiError::remote(ErrorKind::PermissionDenied, "raw detail"));
        assert_eq!(
            err.display_message(),
            "Permission denied. Ensure your service account has the required permissions."
        );
        assert!(err.detail().contains("raw detail"));
    }

    #[test]
    fn test_translation_sees_through_context() {
        let result: Result<(), ApiError> = Err(ApiError::remote(ErrorKind::NotFound, "gone"));
        let err = CliError::failure(result.context("Fetching property").unwrap_err());
        assert_eq!(
            err.display_message(),
            "Resource not found. Please check the ID and try again."
        );
    }

    #[test]
    fn test_other_failures_fall_back_to_generic_message() {
        let err = CliError::failure(anyhow::anyhow!("disk full"));
        assert_eq!(err.display_message(), "An error occurred: disk full");
    }

    #[test]
    fn test_missing_credentials_is_validation() {
        let err = CliError::from(AuthError::NoCredentials);
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "No credentials configured. Run 'ga-cli config init' first."
        );
    }

    #[test]
    fn test_missing_credentials_file_is_validation() {
        let err = CliError::from(ValidationError::NotFound(PathBuf::from("/missing/creds.json")));
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("/missing/creds.json"));
    }
}
