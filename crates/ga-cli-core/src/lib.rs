//! Core library for ga-cli.
//!
//! This crate contains everything the command-line front end needs to talk
//! to the Google Analytics Admin API:
//!
//! - `config`: persisted configuration and credential path validation
//! - `auth`: credential material and the cached `ClientSession`
//! - `api`: the REST client handle, error classification, retry policy
//!   and user-facing error translation
//! - `models`: account, property and data stream resources
//! - `logging`: file + console tracing setup

pub mod api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod models;

pub use api::{AdminClient, ApiError, ErrorKind, RetryPolicy};
pub use auth::{AuthError, ClientSession, Credentials};
pub use config::{CredentialStore, CredentialWarning, ValidationError};
