//! Credential material and OAuth access token minting.
//!
//! Two Google credential document types are supported:
//! - `service_account`: a JSON key file; tokens are minted with a signed
//!   RS256 JWT assertion (JWT-bearer grant)
//! - `authorized_user`: application-default credentials written by gcloud;
//!   tokens are minted with the refresh-token grant

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::api::ApiError;

/// Environment variable holding the default credential file path
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// OAuth scope granting read/write access to the Admin API
const ANALYTICS_EDIT_SCOPE: &str = "https://www.googleapis.com/auth/analytics.edit";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for service account assertions (Google's maximum)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they actually expire
const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;

/// Fallback lifetime when the token endpoint omits `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to read credentials file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid credentials file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid private key in {}: {source}", path.display())]
    InvalidKey {
        path: PathBuf,
        source: jsonwebtoken::errors::Error,
    },

    #[error("Failed to sign credentials assertion for {client_email}: {source}")]
    Signing {
        client_email: String,
        source: jsonwebtoken::errors::Error,
    },

    #[error("No default credentials found")]
    NoCredentials,

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialFile {
    ServiceAccount(ServiceAccountFile),
    AuthorizedUser(AuthorizedUserFile),
}

#[derive(Deserialize)]
struct ServiceAccountFile {
    client_email: String,
    private_key: String,
    private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

#[derive(Deserialize)]
struct AuthorizedUserFile {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

enum Material {
    ServiceAccount {
        client_email: String,
        key_id: Option<String>,
        key: EncodingKey,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

/// Parsed credential material ready to mint access tokens.
pub struct Credentials {
    source: PathBuf,
    token_uri: String,
    material: Material,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("source", &self.source)
            .field("identity", &self.identity())
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// A bearer token together with its expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token can still be sent, leaving a safety margin
    pub fn is_fresh(&self) -> bool {
        Utc::now() + Duration::seconds(TOKEN_EXPIRY_SKEW_SECS) < self.expires_at
    }
}

impl Credentials {
    /// Load and validate credential material from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let contents = fs::read_to_string(path).map_err(|source| AuthError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CredentialFile =
            serde_json::from_str(&contents).map_err(|source| AuthError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let (token_uri, material) = match file {
            CredentialFile::ServiceAccount(sa) => {
                let key = EncodingKey::from_rsa_pem(sa.private_key.as_bytes()).map_err(
                    |source| AuthError::InvalidKey {
                        path: path.to_path_buf(),
                        source,
                    },
                )?;
                (
                    sa.token_uri,
                    Material::ServiceAccount {
                        client_email: sa.client_email,
                        key_id: sa.private_key_id,
                        key,
                    },
                )
            }
            CredentialFile::AuthorizedUser(user) => (
                user.token_uri,
                Material::AuthorizedUser {
                    client_id: user.client_id,
                    client_secret: user.client_secret,
                    refresh_token: user.refresh_token,
                },
            ),
        };

        let credentials = Self {
            source: path.to_path_buf(),
            token_uri,
            material,
        };
        debug!(identity = %credentials.identity(), "Loaded credentials");
        Ok(credentials)
    }

    /// Locate ambient credentials: the file named by
    /// `GOOGLE_APPLICATION_CREDENTIALS`, else the application-default file
    /// written by `gcloud auth application-default login`.
    pub fn discover() -> Result<Self, AuthError> {
        if let Some(path) = std::env::var_os(CREDENTIALS_ENV).filter(|p| !p.is_empty()) {
            debug!(env = CREDENTIALS_ENV, "Using credentials from environment");
            return Self::from_file(Path::new(&path));
        }

        let path = well_known_file().ok_or(AuthError::NoCredentials)?;
        if !path.is_file() {
            return Err(AuthError::NoCredentials);
        }
        debug!(path = %path.display(), "Using application default credentials");
        Self::from_file(&path)
    }

    /// File these credentials were read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Human-readable principal for logs
    pub fn identity(&self) -> String {
        match &self.material {
            Material::ServiceAccount { client_email, .. } => {
                format!("service account {}", client_email)
            }
            Material::AuthorizedUser { client_id, .. } => {
                format!("authorized user (client {})", client_id)
            }
        }
    }

    /// Exchange the credential material for a fresh access token
    pub async fn fetch_token(&self, http: &Client) -> Result<AccessToken, ApiError> {
        let response = match &self.material {
            Material::ServiceAccount {
                client_email,
                key_id,
                key,
            } => {
                let assertion = self.sign_assertion(client_email, key_id.as_deref(), key)?;
                http.post(&self.token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
                    .send()
                    .await?
            }
            Material::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
            } => {
                http.post(&self.token_uri)
                    .form(&[
                        ("grant_type", "refresh_token"),
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("refresh_token", refresh_token.as_str()),
                    ])
                    .send()
                    .await?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_token_failure(status, &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("token response: {}", e)))?;
        let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        debug!(identity = %self.identity(), expires_in = lifetime, "Minted access token");
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }

    fn sign_assertion(
        &self,
        client_email: &str,
        key_id: Option<&str>,
        key: &EncodingKey,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: client_email,
            scope: ANALYTICS_EDIT_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = key_id.map(str::to_string);

        jsonwebtoken::encode(&header, &claims, key).map_err(|source| AuthError::Signing {
            client_email: client_email.to_string(),
            source,
        })
    }
}

fn well_known_file() -> Option<PathBuf> {
    const ADC_FILE: &str = "application_default_credentials.json";

    if let Some(dir) = std::env::var_os("CLOUDSDK_CONFIG") {
        return Some(PathBuf::from(dir).join(ADC_FILE));
    }
    #[cfg(windows)]
    let base = dirs::config_dir()?;
    #[cfg(not(windows))]
    let base = dirs::home_dir()?.join(".config");

    Some(base.join("gcloud").join(ADC_FILE))
}
