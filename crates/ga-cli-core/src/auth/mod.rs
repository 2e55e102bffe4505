//! Authentication module for building Admin API client handles.
//!
//! This module provides:
//! - `Credentials`: parsed credential material (service account key or
//!   authorized user refresh token) and access token minting
//! - `ClientSession`: lazily builds and caches one `AdminClient` per instance

pub mod credentials;
pub mod session;

pub use credentials::{AccessToken, AuthError, Credentials, CREDENTIALS_ENV};
pub use session::{ClientSession, ScopedClient, DEFAULT_TIMEOUT};
